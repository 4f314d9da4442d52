//! Derived display values for a resolved post

use chrono_tz::Tz;

use super::{EditedInfo, Post};
use crate::helpers::format_edit_timestamp;

/// Reading speed used for the estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Whitespace-delimited words across every heading and body block
pub fn total_word_count(post: &Post) -> usize {
    post.data
        .content
        .iter()
        .map(|section| {
            let heading = section.heading.split_whitespace().count();
            let body: usize = section
                .body
                .iter()
                .map(|block| block.text().split_whitespace().count())
                .sum();
            heading + body
        })
        .sum()
}

/// Estimated reading time in whole minutes, rounded up
pub fn estimate_read_time(post: &Post) -> u32 {
    total_word_count(post).div_ceil(WORDS_PER_MINUTE) as u32
}

/// Compare publication dates and format the edit notice
pub fn edited_info(post: &Post, tz: Tz) -> EditedInfo {
    let edited = post.first_publication_date != post.last_publication_date;

    let formatted_edit_timestamp = if edited {
        post.last_publication_date
            .map(|date| format_edit_timestamp(&date.with_timezone(&tz)))
    } else {
        None
    };

    EditedInfo {
        edited,
        formatted_edit_timestamp,
    }
}
