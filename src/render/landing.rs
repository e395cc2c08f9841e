//! Landing page on `/`.

use maud::{html, Markup};

pub fn render() -> Markup {
    super::page(
        "Secret Diary",
        html! {
            main class="center" {
                h1 { "Welcome to Your Secret Diary ✨" }
                p { "Go to " a href="/admin" { strong { "/admin" } } " to log in" }
            }
        },
    )
}
