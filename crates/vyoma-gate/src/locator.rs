use crate::error::GateError;
use crate::report::ScanReport;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use vyoma_config::LocatorStrategy;

/// Fixed report name, archived by the generated CI templates.
pub const WELL_KNOWN_REPORT_NAME: &str = "vyoma-report.json";
const REPORT_PREFIX: &str = "vyoma_report_";
/// Coarse filesystem clocks can stamp a fresh file slightly before launch.
const MTIME_SLACK: Duration = Duration::from_secs(2);

/// What to look for: the scanner's output directory, the target it scanned,
/// and when it was launched. Files last modified before the launch are
/// leftovers from an earlier run and never match.
#[derive(Debug, Clone, Copy)]
pub struct ReportQuery<'a> {
    pub output_dir: &'a Path,
    pub target_url: &'a str,
    pub launched_at: Option<SystemTime>,
}

impl<'a> ReportQuery<'a> {
    pub fn new(output_dir: &'a Path, target_url: &'a str) -> Self {
        Self {
            output_dir,
            target_url,
            launched_at: None,
        }
    }

    pub fn launched_at(mut self, at: SystemTime) -> Self {
        self.launched_at = Some(at);
        self
    }

    /// True if `path` is a regular file written during this run.
    pub fn is_fresh(&self, path: &Path) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        if !meta.is_file() {
            return false;
        }
        let Some(launched_at) = self.launched_at else {
            return true;
        };
        let cutoff = launched_at.checked_sub(MTIME_SLACK).unwrap_or(UNIX_EPOCH);
        let fresh = meta.modified().map_or(false, |mtime| mtime >= cutoff);
        if !fresh {
            tracing::debug!("Ignoring {}: older than this scan", path.display());
        }
        fresh
    }
}

/// Finds the artifact the scanner wrote. On a miss, returns every path that
/// was tried so the caller can report them.
pub trait ReportLocator {
    fn name(&self) -> &'static str;
    fn find(&self, query: &ReportQuery<'_>) -> Result<PathBuf, Vec<PathBuf>>;
}

/// `<output_dir>/vyoma-report.json`
#[derive(Debug, Default, Clone, Copy)]
pub struct WellKnownName;

impl ReportLocator for WellKnownName {
    fn name(&self) -> &'static str {
        "well-known"
    }

    fn find(&self, query: &ReportQuery<'_>) -> Result<PathBuf, Vec<PathBuf>> {
        let path = query.output_dir.join(WELL_KNOWN_REPORT_NAME);
        if query.is_fresh(&path) {
            Ok(path)
        } else {
            Err(vec![path])
        }
    }
}

/// `vyoma_report_<sanitized-url>_<mtime>.json`, where `<mtime>` is read from
/// the output directory when the lookup happens, not before the scan: the
/// scanner's own writes move it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampProbe;

impl ReportLocator for TimestampProbe {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn find(&self, query: &ReportQuery<'_>) -> Result<PathBuf, Vec<PathBuf>> {
        let output_dir = query.output_dir;
        let mtime = match fs::metadata(output_dir).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                tracing::debug!("Cannot read mtime of {}: {}", output_dir.display(), e);
                return Err(vec![output_dir.to_path_buf()]);
            }
        };

        let path = output_dir.join(timestamp_report_name(query.target_url, mtime));
        if query.is_fresh(&path) {
            Ok(path)
        } else {
            Err(vec![path])
        }
    }
}

/// Newest `vyoma_report_<sanitized-url>_*.json` in the output directory
/// written during this run.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatestMatching;

impl ReportLocator for LatestMatching {
    fn name(&self) -> &'static str {
        "latest"
    }

    fn find(&self, query: &ReportQuery<'_>) -> Result<PathBuf, Vec<PathBuf>> {
        // The sanitized URL may contain '/', so the prefix can reach into a subdirectory.
        let prefix_path = query.output_dir.join(format!(
            "{}{}_",
            REPORT_PREFIX,
            sanitize_target(query.target_url)
        ));
        let search_dir = prefix_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| query.output_dir.to_path_buf());
        let prefix = prefix_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pattern = search_dir.join(format!("{}*.json", prefix));

        let Ok(entries) = fs::read_dir(&search_dir) else {
            return Err(vec![pattern]);
        };

        let newest = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.starts_with(&prefix) && name.ends_with(".json")
            })
            .map(|entry| entry.path())
            .filter(|path| query.is_fresh(path))
            .filter_map(|path| {
                let mtime = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((mtime, path))
            })
            .max();

        match newest {
            Some((_, path)) => Ok(path),
            None => Err(vec![pattern]),
        }
    }
}

/// Tries each locator in order; the first hit wins.
pub struct ChainedLocator {
    locators: Vec<Box<dyn ReportLocator>>,
}

impl ChainedLocator {
    pub fn new(locators: Vec<Box<dyn ReportLocator>>) -> Self {
        Self { locators }
    }
}

impl ReportLocator for ChainedLocator {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn find(&self, query: &ReportQuery<'_>) -> Result<PathBuf, Vec<PathBuf>> {
        let mut attempted = Vec::new();
        for locator in &self.locators {
            match locator.find(query) {
                Ok(path) => {
                    tracing::debug!("Report found by {} locator", locator.name());
                    return Ok(path);
                }
                Err(tried) => attempted.extend(tried),
            }
        }
        Err(attempted)
    }
}

pub fn locator_for(strategy: LocatorStrategy) -> Box<dyn ReportLocator> {
    match strategy {
        LocatorStrategy::Auto => Box::new(ChainedLocator::new(vec![
            Box::new(WellKnownName),
            Box::new(TimestampProbe),
            Box::new(LatestMatching),
        ])),
        LocatorStrategy::WellKnown => Box::new(WellKnownName),
        LocatorStrategy::Timestamp => Box::new(TimestampProbe),
        LocatorStrategy::Latest => Box::new(LatestMatching),
    }
}

/// A report that was found and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedReport {
    pub path: PathBuf,
    pub report: ScanReport,
}

pub fn locate(
    locator: &dyn ReportLocator,
    query: &ReportQuery<'_>,
) -> Result<LocatedReport, GateError> {
    let path = locator
        .find(query)
        .map_err(|attempted| GateError::ReportNotFound { attempted })?;

    tracing::info!("Using report {}", path.display());
    let report = load_report(&path)?;
    Ok(LocatedReport { path, report })
}

/// Read and parse a report. Never falls back to an empty report.
pub fn load_report(path: &Path) -> Result<ScanReport, GateError> {
    let content = fs::read_to_string(path).map_err(|e| GateError::ReportParse {
        path: path.to_path_buf(),
        reason: format!("failed to read file: {}", e),
    })?;

    ScanReport::from_json(&content).map_err(|e| GateError::ReportParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Strip the scheme and replace dots, matching the scanner's file naming.
pub fn sanitize_target(target_url: &str) -> String {
    target_url
        .replace("http://", "")
        .replace("https://", "")
        .replace('.', "_")
}

pub fn timestamp_report_name(target_url: &str, dir_mtime: SystemTime) -> String {
    format!(
        "{}{}_{}.json",
        REPORT_PREFIX,
        sanitize_target(target_url),
        format_mtime(dir_mtime)
    )
}

/// Fractional epoch seconds in shortest round-trip form, always with a
/// decimal point (`1700000000.0`, `1700000000.25`).
fn format_mtime(mtime: SystemTime) -> String {
    let since_epoch = mtime.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs() as f64 + f64::from(since_epoch.subsec_nanos()) * 1e-9;
    let rendered = format!("{}", secs);
    if rendered.contains('.') {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const REPORT: &str = r#"{"vulnerabilities": [{"severity": "high"}]}"#;

    /// Writes `content` and backdates it to an hour ago.
    fn write_stale(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(hour_ago)
            .unwrap();
    }

    #[test]
    fn sanitizes_like_the_scanner() {
        assert_eq!(sanitize_target("https://shop.example.com"), "shop_example_com");
        assert_eq!(sanitize_target("http://localhost"), "localhost");
        assert_eq!(sanitize_target("http://10.0.0.1:8080/app"), "10_0_0_1:8080/app");
    }

    #[test]
    fn timestamp_name_formatting() {
        let whole = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(
            timestamp_report_name("https://example.com", whole),
            "vyoma_report_example_com_1700000000.0.json"
        );

        let fractional = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        assert_eq!(format_mtime(fractional), "1700000000.25");
    }

    #[test]
    fn well_known_name_hit_and_miss() {
        let dir = tempdir().unwrap();
        let query = ReportQuery::new(dir.path(), "http://x");
        let err = WellKnownName.find(&query).unwrap_err();
        assert_eq!(err, vec![dir.path().join("vyoma-report.json")]);

        fs::write(dir.path().join(WELL_KNOWN_REPORT_NAME), REPORT).unwrap();
        let found = WellKnownName.find(&query).unwrap();
        assert_eq!(found, dir.path().join("vyoma-report.json"));
    }

    #[cfg(unix)]
    #[test]
    fn timestamp_probe_uses_directory_mtime_at_lookup() {
        let dir = tempdir().unwrap();
        let stamp = UNIX_EPOCH + Duration::from_secs(1_650_000_000);
        let expected = dir.path().join(timestamp_report_name("http://example.com", stamp));
        fs::write(&expected, REPORT).unwrap();

        let query = ReportQuery::new(dir.path(), "http://example.com");

        // The write moved the directory mtime away from `stamp`.
        assert!(TimestampProbe.find(&query).is_err());

        fs::File::open(dir.path())
            .unwrap()
            .set_modified(stamp)
            .unwrap();
        let found = TimestampProbe.find(&query).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn latest_matching_picks_newest_report_for_target() {
        let dir = tempdir().unwrap();
        let older = dir.path().join("vyoma_report_example_com_100.0.json");
        let newer = dir.path().join("vyoma_report_example_com_200.0.json");
        let other_target = dir.path().join("vyoma_report_other_org_300.0.json");
        fs::write(&older, REPORT).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fs::write(&newer, REPORT).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fs::write(&other_target, REPORT).unwrap();

        let query = ReportQuery::new(dir.path(), "https://example.com");
        let found = LatestMatching.find(&query).unwrap();
        assert_eq!(found, newer);
    }

    #[test]
    fn reports_from_earlier_runs_are_ignored() {
        let dir = tempdir().unwrap();
        let launched = SystemTime::now();
        let query = ReportQuery::new(dir.path(), "https://example.com").launched_at(launched);

        write_stale(&dir.path().join(WELL_KNOWN_REPORT_NAME), REPORT);
        let stale_named = dir.path().join("vyoma_report_example_com_100.0.json");
        write_stale(&stale_named, REPORT);

        assert_eq!(
            WellKnownName.find(&query).unwrap_err(),
            vec![dir.path().join(WELL_KNOWN_REPORT_NAME)]
        );
        assert!(LatestMatching.find(&query).is_err());

        // Without a launch time the same files are accepted.
        let unbounded = ReportQuery::new(dir.path(), "https://example.com");
        assert!(WellKnownName.find(&unbounded).is_ok());
        assert_eq!(LatestMatching.find(&unbounded).unwrap(), stale_named);

        let fresh = dir.path().join("vyoma_report_example_com_200.0.json");
        fs::write(&fresh, REPORT).unwrap();
        assert_eq!(LatestMatching.find(&query).unwrap(), fresh);
        assert_eq!(
            locator_for(LocatorStrategy::Auto).find(&query).unwrap(),
            fresh
        );
    }

    #[test]
    fn auto_prefers_well_known_name_and_collects_misses() {
        let dir = tempdir().unwrap();
        let locator = locator_for(LocatorStrategy::Auto);
        let query = ReportQuery::new(dir.path(), "http://example.com");

        let attempted = locator.find(&query).unwrap_err();
        assert_eq!(attempted.len(), 3);
        assert_eq!(attempted[0], dir.path().join("vyoma-report.json"));

        fs::write(dir.path().join("vyoma_report_example_com_1.0.json"), REPORT).unwrap();
        fs::write(dir.path().join(WELL_KNOWN_REPORT_NAME), REPORT).unwrap();
        let found = locator.find(&query).unwrap();
        assert_eq!(found, dir.path().join(WELL_KNOWN_REPORT_NAME));
    }

    #[test]
    fn locate_reports_missing_and_malformed_artifacts() {
        let dir = tempdir().unwrap();
        let query = ReportQuery::new(dir.path(), "http://x");
        let err = locate(&WellKnownName, &query).unwrap_err();
        assert!(matches!(err, GateError::ReportNotFound { .. }));

        fs::write(dir.path().join(WELL_KNOWN_REPORT_NAME), "{\"vulnerabilities\": [").unwrap();
        let err = locate(&WellKnownName, &query).unwrap_err();
        assert!(matches!(err, GateError::ReportParse { .. }));

        fs::write(dir.path().join(WELL_KNOWN_REPORT_NAME), REPORT).unwrap();
        let located = locate(&WellKnownName, &query).unwrap();
        assert_eq!(located.report.len(), 1);
    }
}
