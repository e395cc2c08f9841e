//! Magic-link login form, rendered in place of protected pages.

use maud::{html, Markup};

use super::Notice;

pub const LINK_SENT_MESSAGE: &str = "Check your email! Magic link sent. ✨";

pub fn render(email: &str, notice: Option<&Notice>, request_id: &str) -> Markup {
    super::page(
        "Login to Your Diary",
        html! {
            main class="login" {
                div class="card" {
                    h1 { "Login to Your Diary" }
                    p { "Enter your email, no password needed!" }
                    form method="post" action="/admin/login" {
                        input type="hidden" name="request_id" value=(request_id);
                        input class="field" type="email" name="email" placeholder="your@email.com"
                            value=(email) required;
                        button class="btn" type="submit" { "Send Magic Link" }
                    }
                    div style="margin-top:1rem" { (super::notice(notice)) }
                }
            }
        },
    )
}
