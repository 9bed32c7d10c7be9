//! The library code for `blogsplice`, which turns the most recently modified
//! document in a folder into a blog post "card" and splices it into a static
//! HTML page. A run is a straight pipeline:
//!
//! 1. Locating the newest document ([`crate::locate`])
//! 2. Extracting its content as HTML ([`crate::extract`])
//! 3. Wrapping the content in a card ([`crate::card`])
//! 4. Inserting the card after the page's anchor marker ([`crate::page`])
//! 5. Committing and pushing the page ([`crate::publish`])
//!
//! Of these, the second step is the more involved. `.docx` files are read
//! into a flat list of styled paragraphs ([`crate::docx`]) which are then
//! classified one by one ([`crate::htmlrenderer`]), tracking whether a list
//! block is currently open. [`crate::update`] runs the steps in order.
//!
//! Each card carries a key derived from its title and content, so running
//! again against an unchanged document doesn't insert a second copy.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod card;
pub mod config;
pub mod document;
pub mod docx;
pub mod extract;
pub mod htmlrenderer;
pub mod locate;
pub mod markdown;
pub mod page;
pub mod publish;
pub mod update;
