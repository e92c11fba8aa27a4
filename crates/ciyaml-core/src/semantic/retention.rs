use crate::range::{Range, TextAndRange};

/// Smallest accepted cache retention, in days.
pub const MIN_CACHE_RETENTION_DAYS: u32 = 1;

/// Largest accepted cache retention, in days.
pub const MAX_CACHE_RETENTION_DAYS: u32 = 15;

/// A job's `retention:` settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retention {
    pub range: Range,
    /// The `caches` duration, written as `<days>d`.
    pub caches: Option<TextAndRange>,
}

impl Retention {
    /// Returns `true` if the caches duration is absent or lies between
    /// 1 and 15 days.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ciyaml_core::range::{Range, TextAndRange};
    /// # use ciyaml_core::semantic::Retention;
    /// let retention = Retention {
    ///     range: Range::default(),
    ///     caches: Some(TextAndRange::new("7d", Range::default())),
    /// };
    /// assert!(retention.is_caches_duration_valid());
    /// ```
    pub fn is_caches_duration_valid(&self) -> bool {
        let Some(caches) = &self.caches else {
            return true;
        };
        if caches.text.is_empty() {
            return true;
        }

        caches
            .text
            .strip_suffix('d')
            .and_then(|days| days.parse::<u32>().ok())
            .is_some_and(|days| (MIN_CACHE_RETENTION_DAYS..=MAX_CACHE_RETENTION_DAYS).contains(&days))
    }
}
