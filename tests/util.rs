//! Shared test utilities for integration tests
//!
//! Builds small on-disk export trees shaped like real chat dumps:
//! `data/<guild>/<channel>.csv` with the usual author columns.

#![allow(dead_code)]

use assert_fs::prelude::*;

/// Header row used by every fixture export
pub const HEADER: &str =
    "author.id,author.username,author.global_name,author.bot,timestamp,content\n";

/// One CSV row; content is quoted so commas and newlines survive
pub fn row(
    id: &str,
    name: &str,
    bot: bool,
    timestamp: &str,
    content: &str,
) -> String
{
    let escaped = content.replace('"', "\"\"");
    format!("{id},{name},{name},{bot},{timestamp},\"{escaped}\"\n")
}

/// Two guilds, three humans and one bot.
///
/// Ann talks the most and repeats "gg gg gg"; Bo shares some vocabulary with
/// Ann; Cy writes about something else entirely. The bot only says "beep".
pub fn make_export_fixture() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    let mut general = String::from(HEADER);
    general.push_str(&row("1", "Ann", false, "2024-03-01T21:15:00Z", "gg gg gg"));
    general.push_str(&row("1", "Ann", false, "2024-03-01T21:20:00Z", "nice game well played!"));
    general.push_str(&row("1", "Ann", false, "2024-03-01T22:01:00Z", "gg gg gg"));
    general.push_str(&row("1", "Ann", false, "not-a-timestamp", "https://example.com/clip"));
    general.push_str(&row("2", "Bo", false, "2024-03-02 09:00:00", "nice game, wanna queue again?"));
    general.push_str(&row("9", "Beeper", true, "2024-03-02T09:01:00Z", "beep beep boop"));

    tmp.child("data/league/general.csv")
        .write_str(&general)
        .expect("write general.csv");

    let mut cooking = String::from(HEADER);
    cooking.push_str(&row("3", "Cy", false, "", "pasta needs more garlic honestly"));
    cooking.push_str(&row("2", "Bo", false, "", "lol that pasta looked great"));

    tmp.child("data/cooking/recipes.csv")
        .write_str(&cooking)
        .expect("write recipes.csv");

    tmp
}
