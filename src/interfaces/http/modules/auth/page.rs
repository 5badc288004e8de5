//! Minimal HTML pages for the emailed reset link

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

/// Inline styles only; no scripts, and the form may only post back here.
const PAGE_CSP: &str =
    "default-src 'none'; style-src 'unsafe-inline'; form-action 'self'; frame-ancestors 'none'";

const RESET_FORM_ACTION: &str = "/api/v1/auth/reset-password/form";

const STYLE: &str = "\
body{font-family:Arial,sans-serif;max-width:400px;margin:50px auto;padding:20px}\
input{width:100%;padding:10px;margin:10px 0;box-sizing:border-box}\
button{width:100%;padding:12px;background:#667eea;color:#fff;border:none;border-radius:5px}";

/// Reset tokens are hex; anything else cannot be one.
pub fn is_token_shaped(token: &str) -> bool {
    !token.is_empty() && token.len() <= 128 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn reset_form(token: &str) -> Response {
    let body = format!(
        "<h2>Reset your password</h2>\
         <form method=\"post\" action=\"{action}\">\
         <input type=\"hidden\" name=\"token\" value=\"{token}\">\
         <input type=\"password\" name=\"new_password\" placeholder=\"New password (min 8 chars)\" \
         required minlength=\"8\" autocomplete=\"new-password\">\
         <button type=\"submit\">Reset password</button>\
         </form>",
        action = RESET_FORM_ACTION,
        token = escape(token),
    );
    render(StatusCode::OK, "Reset password", &body)
}

pub fn reset_done() -> Response {
    render(
        StatusCode::OK,
        "Password reset",
        "<h2>Password reset</h2><p>You can now log in with your new password.</p>",
    )
}

pub fn reset_failed(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<h2>Password reset failed</h2><p>{}</p>",
        escape(message)
    );
    render(status, "Password reset failed", &body)
}

fn render(status: StatusCode, title: &str, body: &str) -> Response {
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{}</style></head><body>{}</body></html>",
        title, STYLE, body
    );
    (status, [(header::CONTENT_SECURITY_POLICY, PAGE_CSP)], Html(html)).into_response()
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
