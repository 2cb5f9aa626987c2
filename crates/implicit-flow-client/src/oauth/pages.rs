//! HTML pages served during the flow.

use crate::oauth::bearer::BearerClaims;

/// Render the landing page for `GET /login/oauth/callback`.
///
/// The authorization server puts the token in the URL fragment, which never
/// reaches the server. The script moves the fragment into the query string of
/// `callback_path` so the callback handler can see it.
#[must_use]
pub fn render_landing_page(callback_path: &str) -> String {
    let target = serde_json::to_string(callback_path).unwrap_or_else(|_| "\"/\"".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="referrer" content="no-referrer">
<title>Signing in...</title>
</head>
<body>
<p>Completing sign-in...</p>
<noscript>JavaScript is required to complete sign-in: the access token is delivered in the URL fragment.</noscript>
<script>
(function () {{
  var params = window.location.hash.substring(1) || window.location.search.substring(1);
  window.location.replace({target} + (params ? "?" + params : ""));
}})();
</script>
</body>
</html>"#
    )
}

/// Render the terminal confirmation page for an accepted callback.
#[must_use]
pub fn render_greeting_page(claims: Option<&BearerClaims>) -> String {
    let who = claims
        .and_then(BearerClaims::display_name)
        .map(|name| format!(", {}", html_escape(name)))
        .unwrap_or_default();
    let issued = claims
        .and_then(BearerClaims::issued_at)
        .map(|at| format!("<p class=\"meta\">Token issued {}</p>", at.format("%Y-%m-%d %H:%M:%S UTC")))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Signed in</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #f5f5f5; margin: 0; display: flex; justify-content: center; align-items: center; min-height: 100vh; }}
.card {{ background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); padding: 32px; max-width: 400px; width: 100%; }}
h1 {{ font-size: 20px; margin: 0 0 8px; color: #333; }}
.meta {{ color: #666; font-size: 14px; }}
</style>
</head>
<body>
<div class="card">
<h1>Greetings{who}!</h1>
<p>You have been signed in through the authorization server.</p>
{issued}
</div>
</body>
</html>"#
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
