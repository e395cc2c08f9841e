//! HTML rendering for every page of the diary.
//!
//! All pages are built with [maud](https://maud.lambda.xyz/), which escapes
//! every dynamic value. Pages share one inline stylesheet and ship no script.

pub mod dashboard;
pub mod landing;
pub mod login;
pub mod reveal;

use maud::{html, Markup, PreEscaped, DOCTYPE};

/// Inline CSS for all pages.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#0d1d2c;--fg:#1f2937;--fg2:#4b5563;--fg3:#9ca3af;--accent:#4f46e5;--accent2:#7c3aed;--surface:#fff;--danger:#e11d48;--ok:#047857}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:var(--fg);background:linear-gradient(135deg,#eef2ff,#faf5ff,#fdf2f8);min-height:100vh}
main{max-width:960px;margin:0 auto;padding:2rem 1rem}
a{color:var(--accent)}
h1,h2,h3,h4{line-height:1.25}
.topbar{position:sticky;top:0;background:rgba(255,255,255,.85);border-bottom:1px solid #e0e7ff;padding:1rem}
.topbar-inner{max-width:960px;margin:0 auto;display:flex;justify-content:space-between;align-items:center}
.brand{font-size:1.6rem;font-weight:700;color:var(--accent)}
.btn{display:inline-block;border:none;border-radius:10px;padding:.6rem 1.2rem;font-size:.95rem;font-weight:600;cursor:pointer;text-decoration:none;color:#fff;background:var(--accent)}
.btn-danger{background:var(--danger)}
.btn-muted{background:#e5e7eb;color:var(--fg)}
.btn-warn{background:#f59e0b}
.notice{padding:1rem;border-radius:12px;text-align:center;font-weight:500;margin-bottom:2rem}
.notice-success{background:#ecfdf5;color:var(--ok);border:1px solid #a7f3d0}
.notice-error{background:#fff1f2;color:var(--danger);border:1px solid #fecdd3}
.notice input{margin-top:.75rem}
.card{background:var(--surface);border-radius:16px;padding:1.5rem;box-shadow:0 8px 30px rgba(0,0,0,.08)}
form .field{display:block;width:100%;padding:.9rem 1rem;border:1px solid #e5e7eb;border-radius:10px;font-size:1rem;margin-bottom:1rem;font-family:inherit}
.form-actions{display:flex;gap:1rem}
.entries{display:grid;grid-template-columns:repeat(auto-fill,minmax(380px,1fr));gap:1.5rem;margin-top:1.5rem}
.entry-head{display:flex;justify-content:space-between;align-items:flex-start;margin-bottom:1rem}
.entry-name{font-size:1.2rem;color:#3730a3}
.entry-rel{font-size:.85rem;color:var(--accent)}
.entry-actions{display:flex;gap:.5rem}
.entry-actions .btn{padding:.4rem .9rem;font-size:.85rem}
.thoughts{white-space:pre-wrap;word-break:break-word;color:var(--fg2);margin-bottom:1.25rem}
.entry-foot{display:flex;flex-wrap:wrap;gap:.75rem;align-items:center;font-size:.85rem;color:var(--fg3)}
.share{width:100%;font-family:ui-monospace,Menlo,monospace;font-size:.8rem;padding:.4rem;border:1px solid #e5e7eb;border-radius:6px}
.empty{text-align:center;padding:3rem;color:var(--fg2)}
.center{text-align:center;padding:4rem 1rem}
.reveal{max-width:700px;margin:4rem auto;padding:2.5rem;background:#ded7d7;border-radius:12px;box-shadow:0 8px 30px rgba(0,0,0,.12);text-align:center;color:#000}
.reveal h1{color:#2a9d8f}
.reveal .from{color:#666;margin-bottom:2rem}
.reveal .body{font-size:1.3rem;line-height:1.7;white-space:pre-wrap;margin:2rem 0;padding:1.5rem;background:#f1f8ff;border-radius:8px}
.reveal small{color:#777}
.missing{color:#e63946}
.login{max-width:480px;margin:4rem auto}
.login p{margin:.5rem 0 1rem}
"#;

/// Full HTML document around `body`.
pub fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="robots" content="noindex";
                title { (title) }
                style { (PreEscaped(PAGE_CSS)) }
            }
            body { (body) }
        }
    }
}

pub fn error_page(title: &str, message: &str) -> Markup {
    page(
        title,
        html! {
            main class="center" {
                h1 { (title) }
                p { (message) }
                p { a href="/" { "Back home" } }
            }
        },
    )
}

/// Kind of status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient status message shown above a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    /// Optional value shown in a read-only field, e.g. a share link to copy.
    pub copy: Option<String>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
            copy: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
            copy: None,
        }
    }

    pub fn with_copy(mut self, value: impl Into<String>) -> Self {
        self.copy = Some(value.into());
        self
    }
}

pub fn notice(notice: Option<&Notice>) -> Markup {
    html! {
        @if let Some(n) = notice {
            @let class = match n.kind {
                NoticeKind::Success => "notice notice-success",
                NoticeKind::Error => "notice notice-error",
            };
            div class=(class) role="status" {
                (n.text)
                @if let Some(value) = &n.copy {
                    input class="share" type="text" readonly value=(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_escapes_title() {
        let html = page("<b>x</b>", html! { p { "hi" } }).into_string();
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn notice_classes() {
        let html = notice(Some(&Notice::error("Error saving: boom"))).into_string();
        assert!(html.contains("notice-error"));
        assert!(html.contains("Error saving: boom"));

        let html = notice(Some(&Notice::success("ok").with_copy("http://x/s/t"))).into_string();
        assert!(html.contains("notice-success"));
        assert!(html.contains(r#"value="http://x/s/t""#));

        assert!(notice(None).into_string().is_empty());
    }
}
