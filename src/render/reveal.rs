//! Public reveal page for a shared entry.

use maud::{html, Markup};

use crate::models::{display_date, RevealedEntry};

/// The only message a visitor sees for an unknown token or a failed lookup.
pub const NOT_FOUND_MESSAGE: &str = "This link is invalid or has expired.";

pub fn found(entry: &RevealedEntry) -> Markup {
    super::page(
        "A secret message for you",
        html! {
            main {
                div class="reveal" {
                    h1 { "Hey " (entry.name) "!" }
                    @if let Some(relationship) = &entry.relationship {
                        p class="from" { "From your " (relationship) }
                    }
                    div class="body" { (entry.thoughts) }
                    small { "Secret message created on " (display_date(&entry.created_at)) }
                }
            }
        },
    )
}

pub fn not_found() -> Markup {
    super::page(
        "Secret not found",
        html! {
            main class="center missing" {
                h2 { "Oops... 🤫" }
                p { (NOT_FOUND_MESSAGE) }
                p { "Maybe the link expired or was mistyped?" }
            }
        },
    )
}
