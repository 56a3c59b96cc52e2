use std::fs::File;
use std::io;
use std::io::Write;
use std::path::PathBuf;

const CONFIG_SAMPLE: &str = r#"# GOOGLE_CLIENT_ID, GITHUB_REPO, BRANCH and GITHUB_TOKEN in the environment
# take precedence over this file. GITHUB_TOKEN is only read from the environment.

[server]
address = "0.0.0.0"
port = 8787
# Largest accepted request body in bytes
max_body_bytes = 16777216

[github]
repo = "owner/lifelog-blog"
branch = "main"
# api_url = "https://api.github.com"
# user_agent = "lifelog-uploader"

[auth]
google_client_id = "1234567890-web.apps.googleusercontent.com"

[publishing]
posts_root = "content/posts"
category_routing = true
strict_iso_dates = true
# When false, a failed existence check fails the request instead of creating the file
probe_errors_as_absent = true
# Zone for dates that are not ISO 8601. Process local zone when commented out
# fallback_utc_offset = "+09:00"

# Category label = directory under posts_root. Unknown labels go to "default"
[categories]
"雑記" = "misc"
"食事" = "meals"
"フィットネス" = "fitness"
default = "misc"

# For the log location, if you want it to be relative to the executable directory
# use ${exe_dir}/location
[log]
level = "Info"
log_to_console = true
"#;

pub(crate) fn write_sample_cfg(file_path: &PathBuf) -> io::Result<()> {
    let mut file = File::create(file_path)?;
    file.write_all(CONFIG_SAMPLE.as_bytes())
}
