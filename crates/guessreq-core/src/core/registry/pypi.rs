use std::collections::BTreeMap;

use guessreq_domain::{is_prerelease, ReleaseEntry, ReleaseHistory};
use serde::Deserialize;
use time::{macros::format_description, Date, OffsetDateTime};

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectResponse {
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReleaseFile {
    #[serde(default)]
    pub upload_time: Option<String>,
    #[serde(default)]
    pub upload_time_iso_8601: Option<String>,
}

impl ReleaseFile {
    /// Upload day at midnight UTC.
    fn upload_day(&self) -> Option<OffsetDateTime> {
        let raw = self
            .upload_time_iso_8601
            .as_deref()
            .or(self.upload_time.as_deref())?;
        let day = raw.split('T').next()?;
        let date = Date::parse(day, format_description!("[year]-[month]-[day]")).ok()?;
        Some(date.midnight().assume_utc())
    }
}

/// One entry per version, dated by its first listed file.
///
/// Versions without files are dropped, as are prereleases unless
/// `include_prereleases` is set.
pub(crate) fn build_release_history(
    response: &ProjectResponse,
    include_prereleases: bool,
) -> ReleaseHistory {
    let entries = response
        .releases
        .iter()
        .filter(|(version, _)| include_prereleases || !is_prerelease(version))
        .filter_map(|(version, files)| {
            let first = files.first()?;
            match first.upload_day() {
                Some(day) => Some(ReleaseEntry::new(version.clone(), day)),
                None => {
                    tracing::debug!(version = %version, "release has no readable upload time");
                    None
                }
            }
        })
        .collect();
    ReleaseHistory::new(entries)
}
