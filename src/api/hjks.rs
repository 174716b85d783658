//! [HJKS outage disclosure](https://hjks.jepx.or.jp/hjks/outages) client.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use reqwest::Client;

use crate::{api::client, error::ReportError, prelude::*};

const OUTAGES_URL: &str = "https://hjks.jepx.or.jp/hjks/outages";
const DATE_FORMAT_SLASHED: &str = "%Y/%m/%d";

/// One outage or curtailment disclosure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutageInformation {
    pub plant_name: String,
    pub unit_name: String,
    pub shutdown_type_name: String,
    pub shutdown_detail: String,
    /// Kept verbatim for display.
    pub stopped_at: String,
    pub will_restarted_at: String,
    pub updated_at: NaiveDateTime,
}

pub struct Api(Client);

impl Api {
    pub fn try_new() -> Result<Self, ReportError> {
        Ok(Self(client::try_new_session()?))
    }

    /// Downloads outage disclosures starting within the closed range
    /// `[from, to]`.
    #[instrument(skip_all, fields(from = %from, to = %to))]
    pub async fn fetch_outages(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OutageInformation>, ReportError> {
        // The search form embeds a per-session CSRF token.
        let page = self.0.get(OUTAGES_URL).send().await?.error_for_status()?.text().await?;
        let csrf = extract_csrf_token(&page).ok_or_else(|| {
            ReportError::PortalResponse("no `_csrf` field on the outages page".to_owned())
        })?;

        // The CSV download only succeeds after the same search ran
        // in-session.
        let mut form = vec![
            ("startdtfrom", format!("{} 00:00", from.format(DATE_FORMAT_SLASHED))),
            ("startdtto", format!("{} 00:00", to.format(DATE_FORMAT_SLASHED))),
            ("_csrf", csrf),
        ];
        self.0.post(OUTAGES_URL).form(&form).send().await?.error_for_status()?;
        form.push(("csv", "csv".to_owned()));
        let body =
            self.0.post(OUTAGES_URL).form(&form).send().await?.error_for_status()?.bytes().await?;

        // The portal serves Windows code page 932.
        let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&body);
        info!(n_bytes = body.len(), "Downloaded the outage CSV");
        parse_outages(&decoded)
    }
}

fn extract_csrf_token(page: &str) -> Option<String> {
    let line = page.lines().find(|line| line.contains("\"_csrf\""))?;
    let (_, tail) = line.split_once("value=\"")?;
    let (value, _) = tail.split_once('"')?;
    Some(value.to_owned())
}

/// Fields per data row; the portal appends more columns than we read.
const FIELD_COUNT: usize = 7;

pub fn parse_outages(body: &str) -> Result<Vec<OutageInformation>, ReportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut outages = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                let line = error.position().map_or(0, csv::Position::line);
                return Err(ReportError::CsvParse { message: error.to_string(), line });
            }
        };
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() < FIELD_COUNT {
            return Err(ReportError::CsvParse {
                message: format!("expected at least {FIELD_COUNT} fields, found {}", record.len()),
                line,
            });
        }
        // Cells may wrap; the row stays one logical record.
        let field = |i: usize| record[i].replace(['\r', '\n'], "");
        let updated_at = parse_updated_at(&field(6)).ok_or_else(|| ReportError::CsvParse {
            message: format!("bad update timestamp `{}`", field(6)),
            line,
        })?;
        outages.push(OutageInformation {
            plant_name: field(0),
            unit_name: field(1),
            shutdown_type_name: field(2),
            shutdown_detail: field(3),
            stopped_at: field(4),
            will_restarted_at: field(5),
            updated_at,
        });
    }
    Ok(outages)
}

/// The portal emits both second and minute precision.
fn parse_updated_at(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y/%m/%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y/%m/%d %H:%M"))
        .ok()
}
