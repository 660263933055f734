/*  This file is part of OneModel, a program to manage knowledge.
    Copyright in each year of 2003-2004 and 2008-2017 inclusive, 2019, 2023, and 2025-2026 inclusive, Luke A. Call.
    OneModel is free software, distributed under a license that includes honesty, the Golden Rule,
    and the GNU Affero General Public License as published by the Free Software Foundation;
    see the file LICENSE for license version and details.
    OneModel is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
    You should have received a copy of the GNU Affero General Public License along with OneModel.  If not, see <http://www.gnu.org/licenses/>
*/
use crate::model::value::Timestamp;
use chrono::prelude::*;
use chrono::LocalResult;
use tracing_subscriber::EnvFilter;

/// This is just a place to put shared code ("Utility") until a grouping for some, or a better idea emerges.
pub struct Util {}

// for explanation, see fn initialize_tracing() below
static TRACING_INIT: std::sync::Once = std::sync::Once::new();

impl Util {
    pub const DATEFORMAT: &'static str = "%Y-%m-%d %H:%M:%S:%3f %Z"; //the %Z output can be > 3 characters.
    pub const DATEFORMAT4: &'static str = "%Y-%m-%d %H:%M";
    pub const DATEFORMAT5: &'static str = "%Y-%m-%d";
    // What parse_timestamp accepts, most specific first. (%Z can't be parsed by chrono, so these
    // are the zone-less versions of the above, read as UTC.)
    const PARSE_FORMATS: [&'static str; 4] = [
        "%Y-%m-%d %H:%M:%S:%3f",
        "%Y-%m-%d %H:%M:%S%.3f",
        "%Y-%m-%d %H:%M:%S",
        Util::DATEFORMAT4,
    ];

    /// Returned by valueHashCode-style functions for a null value, so that nulls hash the same
    /// everywhere (in-memory indexes and operation pools both rely on that).
    pub const NULL_HASH: i32 = 0x2ee8_d3b9;

    /// The usual "no expiry" date for milestoned rows, used when an as-of attribute is not
    /// given one explicitly.
    pub const DEFAULT_INFINITY_MILLIS: i64 = 253_399_708_740_000; // 9999-12-01 23:59:00.000 UTC

    // bounds used when computing the scale of a BigDecimal quotient:
    pub const MIN_QUOTIENT_SCALE: i64 = 6;
    pub const MAX_DECIMAL_PRECISION: i64 = 38;

    pub const NOT_SUPPORTED_ON_AS_OF: &'static str = "cannot order by as of attribute!";

    pub fn useful_date_format(millis: i64) -> String {
        let date: LocalResult<DateTime<Utc>> = Utc.timestamp_millis_opt(millis);
        match date {
            LocalResult::Single(dt) => dt.format(Util::DATEFORMAT).to_string(),
            _ => format!("Error trying to format {} as a date/time; probably a bug.", millis),
        }
    }

    pub fn timestamp_from_millis(millis: i64) -> Option<Timestamp> {
        match Utc.timestamp_millis_opt(millis) {
            LocalResult::Single(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn default_infinity_date() -> Timestamp {
        // (the constant is well within chrono's range, so the fallback is never taken)
        Util::timestamp_from_millis(Util::DEFAULT_INFINITY_MILLIS).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Accepts RFC 3339, or any of the zone-less layouts above (taken as UTC), or just a date.
    pub fn parse_timestamp(input: &str) -> Option<Timestamp> {
        let trimmed = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in Util::PARSE_FORMATS.iter() {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        NaiveDate::parse_from_str(trimmed, Util::DATEFORMAT5)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    /// The usual 31-based hash over UTF-16 code units, so hashes line up with rows hashed elsewhere.
    pub fn string_hash_code(s: &str) -> i32 {
        let mut h: i32 = 0;
        for unit in s.encode_utf16() {
            h = h.wrapping_mul(31).wrapping_add(unit as i32);
        }
        h
    }

    pub fn long_hash_code(v: i64) -> i32 {
        (v ^ ((v as u64) >> 32) as i64) as i32
    }

    /// Safe to call from every test: only the first call installs the subscriber. Set RUST_LOG
    /// (for example "onemodel_finder=debug") to see more.
    pub fn initialize_tracing() {
        TRACING_INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            // (try_init: another test harness may already have installed a global subscriber)
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        });
    }
}
