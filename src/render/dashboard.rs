//! Admin dashboard: entry form, status banner and entry list.

use maud::{html, Markup};

use super::Notice;
use crate::config::Config;
use crate::models::{display_date, Entry};

/// Values of the create-or-edit form. `id` is set in edit mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub id: Option<i64>,
    pub name: String,
    pub relationship: String,
    pub thoughts: String,
}

impl EntryForm {
    /// Pre-fill from an existing entry. The share token is never part of the form.
    pub fn edit(entry: &Entry) -> Self {
        Self {
            id: Some(entry.id),
            name: entry.name.clone(),
            relationship: entry.relationship.clone().unwrap_or_default(),
            thoughts: entry.thoughts.clone(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.id.is_some()
    }
}

pub struct Dashboard<'a> {
    pub email: &'a str,
    pub entries: &'a [Entry],
    pub form: &'a EntryForm,
    pub notice: Option<&'a Notice>,
    pub request_id: &'a str,
    pub config: &'a Config,
}

pub fn render(view: &Dashboard<'_>) -> Markup {
    let form = view.form;
    super::page(
        "Secret Diary",
        html! {
            (header(view.email))
            main {
                (super::notice(view.notice))
                div class="card" {
                    h2 { @if form.is_editing() { "Edit Memory" } @else { "New Secret Thought" } }
                    form method="post" action="/admin/entries" style="margin-top:1.5rem" {
                        input type="hidden" name="request_id" value=(view.request_id);
                        @if let Some(id) = form.id {
                            input type="hidden" name="id" value=(id);
                        }
                        input class="field" name="name" placeholder="Who is this about?"
                            value=(form.name) required;
                        input class="field" name="relationship" placeholder="Your relationship (optional)"
                            value=(form.relationship);
                        textarea class="field" name="thoughts" rows="7"
                            placeholder="Write everything you feel..." required { (form.thoughts) }
                        div class="form-actions" {
                            button class="btn" type="submit" {
                                @if form.is_editing() { "Update Memory" } @else { "Create Secret Entry" }
                            }
                            @if form.is_editing() {
                                a class="btn btn-muted" href="/admin" { "Cancel" }
                            }
                        }
                    }
                }
                section style="margin-top:2.5rem" {
                    h3 { "Your Hidden Thoughts (" (view.entries.len()) ")" }
                    @if view.entries.is_empty() {
                        div class="card empty" style="margin-top:1.5rem" {
                            "Nothing here yet... Start writing your secrets! ✍️"
                        }
                    } @else {
                        div class="entries" {
                            @for entry in view.entries {
                                (entry_card(entry, &view.config.share_link(&entry.secret_token)))
                            }
                        }
                    }
                }
            }
        },
    )
}

fn header(email: &str) -> Markup {
    html! {
        header class="topbar" {
            div class="topbar-inner" {
                span class="brand" { "Secret Diary" }
                form method="post" action="/admin/logout" {
                    span style="margin-right:1rem;color:#6b7280;font-size:.85rem" { (email) }
                    button class="btn btn-danger" type="submit" { "Logout" }
                }
            }
        }
    }
}

fn entry_card(entry: &Entry, share_link: &str) -> Markup {
    html! {
        div class="card" id=(format!("entry-{}", entry.id)) {
            div class="entry-head" {
                div {
                    h4 class="entry-name" { (entry.name) }
                    @if let Some(relationship) = &entry.relationship {
                        p class="entry-rel" { (relationship) }
                    }
                }
                div class="entry-actions" {
                    a class="btn btn-warn" href=(format!("/admin?edit={}", entry.id)) { "Edit" }
                    a class="btn btn-danger" href=(format!("/admin/entries/{}/delete", entry.id)) { "Delete" }
                }
            }
            p class="thoughts" { (entry.thoughts) }
            div class="entry-foot" {
                a class="btn" href=(format!("/admin?link={}", entry.id)) { "Copy Secret Link" }
                span { (display_date(&entry.created_at)) }
                input class="share" type="text" readonly value=(share_link);
            }
        }
    }
}

/// Explicit confirmation step before an entry is deleted.
pub fn confirm_delete(entry: &Entry, request_id: &str) -> Markup {
    super::page(
        "Delete entry?",
        html! {
            main class="login" {
                div class="card" {
                    h2 { "Delete \"" (entry.name) "\"?" }
                    p { "Are you sure you want to delete this entry? This cannot be undone." }
                    form method="post" action=(format!("/admin/entries/{}/delete", entry.id)) {
                        input type="hidden" name="request_id" value=(request_id);
                        input type="hidden" name="confirm" value="yes";
                        div class="form-actions" {
                            button class="btn btn-danger" type="submit" { "Delete" }
                            a class="btn btn-muted" href="/admin" { "Cancel" }
                        }
                    }
                }
            }
        },
    )
}
