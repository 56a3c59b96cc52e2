#[cfg(test)]
pub const LUNCH_SUBMISSION: &str = r#"{
  "title": "Lunch",
  "date": "2025-08-19T13:30:00+09:00",
  "tags": ["ramen", "shibuya"],
  "categories": ["食事"],
  "latitude": 35.6581,
  "longitude": 139.7017,
  "content": "---\ntitle: Lunch\ndate: 2025-08-19T13:30:00+09:00\ncategories: [食事]\n---\nBody\n\n"
}"#;

#[cfg(test)]
pub const LUNCH_CONTENT: &str = "---\ntitle: Lunch\ndate: 2025-08-19T13:30:00+09:00\ncategories: [食事]\n---\nBody";

#[cfg(test)]
pub const LUNCH_PATH: &str = "content/posts/meals/20250819-1330.md";

#[cfg(test)]
pub const LUNCH_HTML_URL: &str = "https://github.com/owner/lifelog-blog/blob/main/content/posts/meals/20250819-1330.md";

/// Trimmed down response of `GET /repos/{repo}/contents/{path}`
#[cfg(test)]
pub const CONTENTS_GET_RESPONSE: &str = r#"{
  "type": "file",
  "encoding": "base64",
  "size": 42,
  "name": "20250819-1330.md",
  "path": "content/posts/meals/20250819-1330.md",
  "content": "LS0tCnRpdGxlOiBMdW5jaAotLS0KQm9keQ==\n",
  "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
  "url": "https://api.github.com/repos/owner/lifelog-blog/contents/content/posts/meals/20250819-1330.md?ref=main"
}"#;

/// Trimmed down response of `PUT /repos/{repo}/contents/{path}`
#[cfg(test)]
pub const CONTENTS_PUT_RESPONSE: &str = r#"{
  "content": {
    "name": "20250819-1330.md",
    "path": "content/posts/meals/20250819-1330.md",
    "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3",
    "html_url": "https://github.com/owner/lifelog-blog/blob/main/content/posts/meals/20250819-1330.md"
  },
  "commit": {
    "sha": "7638417db6d59f3c431d3e1f261cc637155684cd",
    "message": "Add post Lunch"
  }
}"#;

#[cfg(test)]
pub const CONTENTS_CONFLICT_RESPONSE: &str = r#"{"message":"is at 3d21ec53a331a6f037a91c368710b99387d012c1 but expected 0000000000000000000000000000000000000000","documentation_url":"https://docs.github.com/rest/repos/contents#create-or-update-file-contents","status":"409"}"#;

#[cfg(test)]
pub const TOKENINFO_RESPONSE: &str = r#"{
  "iss": "https://accounts.google.com",
  "azp": "1234567890-web.apps.googleusercontent.com",
  "aud": "1234567890-web.apps.googleusercontent.com",
  "sub": "110169484474386276334",
  "email": "writer@example.com",
  "email_verified": "true",
  "iat": "1755577800",
  "exp": "1755581400",
  "alg": "RS256",
  "kid": "f9d97b4cae90bcd76aeb20026f6b770cac221783",
  "typ": "JWT"
}"#;
