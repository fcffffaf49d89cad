// SPDX-License-Identifier: MIT

//! Personal study tools: to-do lists and flashcard decks.

use serde::{Deserialize, Serialize};

/// A to-do list owned by a user, stored in its own collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoList {
    /// Random hex document ID
    pub id: String,
    /// Owner email (lowercase)
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<String>,
    /// When the list was created (RFC 3339)
    pub created_at: String,
}

/// A saved flashcard deck, embedded on the user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub folder_name: String,
    pub quiz_name: String,
    pub flashcards: Vec<Flashcard>,
    /// When the deck was saved (RFC 3339)
    pub created_at: String,
}

/// A single question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}
