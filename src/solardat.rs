//! The main entry point for talking to the archive: station discovery,
//! filename resolution, retrieval and decoding behind one client struct.

use crate::archive::error::FetchError;
use crate::archive::fetcher::{ArchiveFetcher, FetchOutcome};
use crate::archive::naming::CompressedBundle;
use crate::archive::transport::{HttpTransport, Transport};
use crate::decode::archival::DecodedFile;
use crate::error::SolardatError;
use crate::stations::search::{StationIndex, StationQuery};
use crate::types::interval::Interval;
use crate::types::raw_file::RawFile;
use crate::types::station::{LatLon, StationRecord};
use bon::bon;
use chrono::NaiveDate;
use std::sync::Arc;

/// The outcome of resolving, fetching and decoding one station/month file
/// within a [`Solardat::fetch_records`] batch.
#[derive(Debug)]
pub struct RecordsOutcome {
    /// Archive path of the file this outcome belongs to.
    pub path: String,
    pub result: Result<Arc<DecodedFile>, FetchError>,
}

/// Client for the solar radiation archive.
///
/// One `Solardat` instance is one session: fetched files are cached for its
/// lifetime and concurrent requests for the same file are merged into a
/// single retrieval. The station table is an injected, read-only
/// collaborator; by default the bundled copy is used.
///
/// # Examples
///
/// ```rust
/// # use solardat::{Solardat, Interval, SolardatError};
/// # use chrono::NaiveDate;
/// # async fn run() -> Result<(), SolardatError> {
/// let client = Solardat::new()?;
///
/// let paths = client
///     .find_files()
///     .station("EUP")
///     .interval(Interval::Hourly)
///     .start(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
///     .end(NaiveDate::from_ymd_opt(2018, 2, 1).unwrap())
///     .call()?;
///
/// for outcome in client.fetch_many(paths).await {
///     match outcome.result {
///         Ok(raw) => println!("{}: {} bytes", outcome.path, raw.text().len()),
///         Err(e) => eprintln!("{}: {}", outcome.path, e),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Solardat<T: Transport = HttpTransport> {
    fetcher: ArchiveFetcher<T>,
    stations: StationIndex,
}

impl Solardat<HttpTransport> {
    /// A client against the real archive, using the bundled station table.
    pub fn new() -> Result<Self, SolardatError> {
        Ok(Self::from_parts(
            ArchiveFetcher::new(),
            StationIndex::bundled()?,
        ))
    }

    /// A client against the real archive with a caller-supplied station
    /// table.
    pub fn with_stations(stations: StationIndex) -> Self {
        Self::from_parts(ArchiveFetcher::new(), stations)
    }
}

#[bon]
impl<T: Transport> Solardat<T> {
    /// Assembles a client from an already-configured fetcher and station
    /// index. This is the seam for custom transports, base URLs and naming
    /// schemes.
    pub fn from_parts(fetcher: ArchiveFetcher<T>, stations: StationIndex) -> Self {
        Solardat { fetcher, stations }
    }

    /// The station table this client searches.
    pub fn stations(&self) -> &StationIndex {
        &self.stations
    }

    /// Filters the station table. All filters are optional and conjunctive;
    /// with none set, the whole table is returned in ascending-id order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use solardat::{Solardat, Interval, SolardatError};
    /// # fn run() -> Result<(), SolardatError> {
    /// let client = Solardat::new()?;
    /// let oregon_hourly = client
    ///     .fetch_stations()
    ///     .name("or")
    ///     .interval(Interval::Hourly)
    ///     .call();
    /// for station in &oregon_hourly {
    ///     println!("{} ({})", station.name, station.prefix);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn fetch_stations(
        &self,
        name: Option<&str>,
        elements: Option<&[&str]>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        interval: Option<Interval>,
        near: Option<LatLon>,
        max_distance_km: Option<f64>,
    ) -> Vec<StationRecord> {
        self.stations.search(&StationQuery {
            name,
            elements,
            start,
            end,
            interval,
            near,
            max_distance_km,
        })
    }

    /// Resolves the ordered archive paths covering a station and date range
    /// at one granularity. Pure resolution; no network work.
    ///
    /// `station` may be a numeric archive id (`"94255"`) or a filename
    /// prefix (`"EUP"`).
    #[builder]
    pub fn find_files(
        &self,
        station: &str,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, SolardatError> {
        let record = self.resolve(station)?;
        Ok(self
            .fetcher
            .naming()
            .find_files(record, interval, start, end)?)
    }

    /// Resolves the yearly compressed bundles covering a station and date
    /// range. Preferable to [`find_files`](Self::find_files) for bulk
    /// ranges: one round trip per year instead of one per month.
    #[builder]
    pub fn find_compressed(
        &self,
        station: &str,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompressedBundle>, SolardatError> {
        let record = self.resolve(station)?;
        Ok(self
            .fetcher
            .naming()
            .find_compressed(record, interval, start, end)?)
    }

    /// Retrieves one archive file, or serves it from the session cache.
    pub async fn fetch_file(&self, path: &str) -> Result<RawFile, SolardatError> {
        Ok(self.fetcher.fetch_file(path).await?)
    }

    /// Retrieves many files concurrently, reporting per-file outcomes in
    /// input order. One missing or failed file never aborts its siblings.
    pub async fn fetch_many<I>(&self, paths: I) -> Vec<FetchOutcome>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fetcher.fetch_many(paths).await
    }

    /// Fail-fast form of [`fetch_many`](Self::fetch_many).
    pub async fn try_fetch_many<I>(&self, paths: I) -> Result<Vec<RawFile>, SolardatError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Ok(self.fetcher.try_fetch_many(paths).await?)
    }

    /// Retrieves one compressed bundle and extracts its members, populating
    /// the file cache so later per-member fetches are cache hits.
    pub async fn fetch_compressed(&self, path: &str) -> Result<Vec<RawFile>, SolardatError> {
        Ok(self.fetcher.fetch_compressed(path).await?)
    }

    /// Resolves, retrieves and decodes everything covering a station and
    /// date range, in chronological order with per-file outcomes.
    ///
    /// Resolution failures (unknown station, range outside coverage) fail
    /// the whole call; per-file retrieval or decoding failures are reported
    /// in that file's outcome only.
    #[builder]
    pub async fn fetch_records(
        &self,
        station: &str,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RecordsOutcome>, SolardatError> {
        let record = self.resolve(station)?;
        let paths = self
            .fetcher
            .naming()
            .find_files(record, interval, start, end)?;

        let fetched = self.fetcher.fetch_many(paths).await;
        let mut outcomes = Vec::with_capacity(fetched.len());
        for outcome in fetched {
            let result = match outcome.result {
                Ok(raw) => self.fetcher.decoded(&raw).await,
                Err(error) => Err(error),
            };
            outcomes.push(RecordsOutcome {
                path: outcome.path,
                result,
            });
        }
        Ok(outcomes)
    }

    fn resolve(&self, station: &str) -> Result<&StationRecord, SolardatError> {
        self.stations
            .get(station)
            .ok_or_else(|| SolardatError::UnknownStation(station.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::error::DecodeError;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BASE: &str = "http://archive.test";
    const JANUARY: &str = "94255\t2018\t1000\t0\n1\t100\t0.0\t12\n1\t200\t1.5\t11\n";
    // Three fields where the header demands four.
    const MALFORMED_FEBRUARY: &str = "94255\t2018\t1000\t0\n32\t100\t0.0\n";

    #[derive(Default)]
    struct FakeTransport {
        bodies: HashMap<String, Vec<u8>>,
        hits: Arc<AtomicUsize>,
    }

    impl FakeTransport {
        fn with_body(mut self, path: &str, body: &str) -> Self {
            self.bodies
                .insert(format!("{}/{}", BASE, path), body.as_bytes().to_vec());
            self
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
            let url = url.to_string();
            async move {
                self.hits.fetch_add(1, Ordering::SeqCst);
                match self.bodies.get(&url) {
                    Some(body) => Ok(body.clone()),
                    None => Err(FetchError::NotFound(url)),
                }
            }
        }
    }

    fn client(transport: FakeTransport) -> Solardat<FakeTransport> {
        Solardat::from_parts(
            ArchiveFetcher::with_transport(transport).base_url(BASE),
            StationIndex::bundled().unwrap(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn find_files_resolves_eugene_by_prefix_and_id() {
        let client = client(FakeTransport::default());
        let expected = [
            "download/Archive/EUPH1801.txt",
            "download/Archive/EUPH1802.txt",
        ];

        let by_prefix = client
            .find_files()
            .station("EUP")
            .interval(Interval::Hourly)
            .start(date(2018, 1, 1))
            .end(date(2018, 2, 1))
            .call()
            .unwrap();
        assert_eq!(by_prefix, expected);

        let by_id = client
            .find_files()
            .station("94255")
            .interval(Interval::Hourly)
            .start(date(2018, 1, 1))
            .end(date(2018, 2, 1))
            .call()
            .unwrap();
        assert_eq!(by_id, expected);
    }

    #[test]
    fn unknown_station_is_an_error() {
        let client = client(FakeTransport::default());
        let result = client
            .find_files()
            .station("XYZ")
            .interval(Interval::Hourly)
            .start(date(2018, 1, 1))
            .end(date(2018, 2, 1))
            .call();
        assert!(matches!(result, Err(SolardatError::UnknownStation(_))));
    }

    #[test]
    fn range_outside_coverage_is_an_error() {
        let client = client(FakeTransport::default());
        // Silver Lake stopped reporting at the end of 2002.
        let result = client
            .find_files()
            .station("SIR")
            .interval(Interval::Hourly)
            .start(date(2018, 1, 1))
            .end(date(2018, 2, 1))
            .call();
        assert!(matches!(
            result,
            Err(SolardatError::Fetch(FetchError::Range { .. }))
        ));
    }

    #[test]
    fn fetch_stations_with_no_filters_lists_whole_table() {
        let client = client(FakeTransport::default());
        let all = client.fetch_stations().call();
        assert_eq!(all.len(), client.stations().records().len());
        let ids: Vec<u32> = all.iter().map(|s| s.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn malformed_month_is_reported_per_file() {
        let client = client(
            FakeTransport::default()
                .with_body("download/Archive/EUPH1801.txt", JANUARY)
                .with_body("download/Archive/EUPH1802.txt", MALFORMED_FEBRUARY),
        );

        let outcomes = client
            .fetch_records()
            .station("EUP")
            .interval(Interval::Hourly)
            .start(date(2018, 1, 1))
            .end(date(2018, 2, 1))
            .call()
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);

        let january = outcomes[0].result.as_ref().unwrap();
        assert_eq!(january.station_id(), 94255);
        assert_eq!(january.records.len(), 2);

        assert!(matches!(
            outcomes[1].result,
            Err(FetchError::Decode(DecodeError::FieldCount { .. }))
        ));
    }

    #[tokio::test]
    async fn fetch_records_reuses_the_session_cache() {
        let transport =
            FakeTransport::default().with_body("download/Archive/EUPH1801.txt", JANUARY);
        let hits = Arc::clone(&transport.hits);
        let client = client(transport);

        for _ in 0..2 {
            let outcomes = client
                .fetch_records()
                .station("EUP")
                .interval(Interval::Hourly)
                .start(date(2018, 1, 1))
                .end(date(2018, 1, 31))
                .call()
                .await
                .unwrap();
            assert!(outcomes[0].result.is_ok());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
