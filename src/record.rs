//! Record types flowing through the scrape pipeline
//!
//! An [`ItemLink`] is produced by the listing extractor and consumed by exactly
//! one worker. The worker turns the fetched [`RawPage`] into a [`PartialRecord`],
//! and only a [`ValidatedRecord`] (all four fields present) may reach the sink.

use std::fmt;

/// Absolute URL of one detail page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemLink(String);

impl ItemLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw response body together with the URL it was fetched from
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub body: Vec<u8>,
}

impl RawPage {
    pub fn new(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// The fixed set of fields extracted from a detail page, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    ReleaseDate,
    Rating,
    PlotSummary,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Title,
        Field::ReleaseDate,
        Field::Rating,
        Field::PlotSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::ReleaseDate => "release_date",
            Self::Rating => "rating",
            Self::PlotSummary => "plot_summary",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields located on a detail page; any of them may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub rating: Option<String>,
    pub plot_summary: Option<String>,
}

impl PartialRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Title => &self.title,
            Field::ReleaseDate => &self.release_date,
            Field::Rating => &self.rating,
            Field::PlotSummary => &self.plot_summary,
        };
        value.as_deref()
    }

    /// Fields that are absent or empty, in output order
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.get(*field).map_or(true, str::is_empty))
            .collect()
    }

    /// Promotes this record to a [`ValidatedRecord`] if every field is present
    /// and non-empty, otherwise returns the missing fields.
    pub fn validate(self) -> Result<ValidatedRecord, Vec<Field>> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }

        match (self.title, self.release_date, self.rating, self.plot_summary) {
            (Some(title), Some(release_date), Some(rating), Some(plot_summary)) => {
                Ok(ValidatedRecord {
                    title,
                    release_date,
                    rating,
                    plot_summary,
                })
            }
            _ => Err(Field::ALL.to_vec()),
        }
    }
}

/// A record with all four fields present; the only shape the sink accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    title: String,
    release_date: String,
    rating: String,
    plot_summary: String,
}

impl ValidatedRecord {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn release_date(&self) -> &str {
        &self.release_date
    }

    pub fn rating(&self) -> &str {
        &self.rating
    }

    pub fn plot_summary(&self) -> &str {
        &self.plot_summary
    }

    /// Field values in output order
    pub fn fields(&self) -> [&str; 4] {
        [
            &self.title,
            &self.release_date,
            &self.rating,
            &self.plot_summary,
        ]
    }
}
