//! [OCCTO unit-level generation disclosure](https://hatsuden-kokai.occto.or.jp) client.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use csv::ReaderBuilder;
use reqwest::{Client, multipart};

use crate::{api::client, error::ReportError, prelude::*, summary::SLOTS_PER_DAY, units::SlotKilowattHours};

const BASE_URL: &str = "https://hatsuden-kokai.occto.or.jp/hks-web-public";
const DISCLAIMER_ENDPOINT: &str = "/disclaimer-agree/next";
const SEARCH_ENDPOINT: &str = "/info/hks/search";
const DOWNLOAD_ENDPOINT: &str = "/info/hks/downloadCsv";

const DATE_FORMAT_SLASHED: &str = "%Y/%m/%d";
const DATETIME_FORMAT_SLASHED: &str = "%Y/%m/%d %H:%M:%S";

/// Fields per data row in the download CSV: identification and date
/// columns, 48 slot columns, a daily total, and the update timestamp.
const FIELD_COUNT: usize = 56;

/// One unit's generation over one 30-minute slot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Measurement {
    pub plant_name: String,
    pub unit_name: String,
    /// Start of the slot.
    pub measured_at: NaiveDateTime,
    /// Energy over the slot.
    pub measurements: SlotKilowattHours,
    pub updated_at: NaiveDateTime,
}

pub struct Api(Client);

impl Api {
    pub fn try_new() -> Result<Self, ReportError> {
        Ok(Self(client::try_new_session()?))
    }

    /// Downloads the closed range `[from, to]` and expands every row into
    /// its 48 per-slot measurements.
    #[instrument(skip_all, fields(from = %from, to = %to))]
    pub async fn fetch_measurements(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Measurement>, ReportError> {
        let params = [
            ("areaCheckbox", "99".to_owned()),
            ("hatudenHosikiCheckbox", "99".to_owned()),
            ("tgtDateDateFrom", from.format(DATE_FORMAT_SLASHED).to_string()),
            ("tgtDateDateTo", to.format(DATE_FORMAT_SLASHED).to_string()),
        ];

        // The download only succeeds once the session has agreed to the
        // disclaimer and run the same search.
        self.0
            .post(format!("{BASE_URL}{DISCLAIMER_ENDPOINT}"))
            .query(&[("agreed", "0")])
            .send()
            .await?
            .error_for_status()?;
        let mut form = multipart::Form::new();
        for (name, value) in &params {
            form = form.text(*name, value.clone());
        }
        self.0
            .post(format!("{BASE_URL}{SEARCH_ENDPOINT}"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let body = self
            .0
            .get(format!("{BASE_URL}{DOWNLOAD_ENDPOINT}"))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        info!(n_bytes = body.len(), "Downloaded the measurement CSV");
        parse_measurements(&body)
    }
}

/// Parses the download CSV. Every data row must carry exactly
/// [`FIELD_COUNT`] fields; anything else fails the run, naming the
/// offending physical line (the header is line 1).
#[expect(clippy::cast_possible_wrap)]
pub fn parse_measurements(body: &str) -> Result<Vec<Measurement>, ReportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut measurements = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                let line = error.position().map_or(0, csv::Position::line);
                return Err(ReportError::CsvParse { message: error.to_string(), line });
            }
        };
        let line = record.position().map_or(0, csv::Position::line);
        let parse_failure =
            |message: String| ReportError::CsvParse { message, line };

        if record.len() != FIELD_COUNT {
            return Err(parse_failure(format!(
                "expected {FIELD_COUNT} fields, found {}",
                record.len()
            )));
        }
        let plant_name = record[2].to_owned();
        let unit_name = record[3].to_owned();
        let midnight = NaiveDate::parse_from_str(&record[5], DATE_FORMAT_SLASHED)
            .map_err(|error| parse_failure(format!("bad target date `{}`: {error}", &record[5])))?
            .and_time(NaiveTime::MIN);
        let updated_at = NaiveDateTime::parse_from_str(&record[55], DATETIME_FORMAT_SLASHED)
            .map_err(|error| {
                parse_failure(format!("bad update timestamp `{}`: {error}", &record[55]))
            })?;

        for (slot, field) in record.iter().skip(6).take(SLOTS_PER_DAY).enumerate() {
            let energy = if field.is_empty() {
                0
            } else {
                field
                    .parse()
                    .map_err(|error| parse_failure(format!("bad slot value `{field}`: {error}")))?
            };
            measurements.push(Measurement {
                plant_name: plant_name.clone(),
                unit_name: unit_name.clone(),
                measured_at: midnight + TimeDelta::minutes(30 * slot as i64),
                measurements: SlotKilowattHours(energy),
                updated_at,
            });
        }
    }
    Ok(measurements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expands_rows_into_slots() -> Result<(), ReportError> {
        let body = format!("{}\n{}\n{}\n", header(), row("柏崎刈羽", "1号機"), row("柏崎刈羽", "2号機"));
        let measurements = parse_measurements(&body)?;
        assert_eq!(measurements.len(), 2 * SLOTS_PER_DAY);

        let first = &measurements[0];
        assert_eq!(first.plant_name, "柏崎刈羽");
        assert_eq!(first.unit_name, "1号機");
        assert_eq!(first.measurements, SlotKilowattHours(550_000));
        assert_eq!(first.measured_at.format("%H:%M").to_string(), "00:00");
        assert_eq!(measurements[1].measured_at.format("%H:%M").to_string(), "00:30");
        assert_eq!(measurements[47].measured_at.format("%H:%M").to_string(), "23:30");
        Ok(())
    }

    #[test]
    fn test_parse_treats_blank_slots_as_zero() -> Result<(), ReportError> {
        let mut fields = row_fields("A", "1号機");
        fields[6] = String::new();
        let body = format!("{}\n{}\n", header(), fields.join(","));
        let measurements = parse_measurements(&body)?;
        assert_eq!(measurements[0].measurements, SlotKilowattHours(0));
        Ok(())
    }

    #[test]
    fn test_parse_fails_on_55_fields_naming_the_line() {
        let mut fields = row_fields("A", "1号機");
        fields.pop();
        let body = format!("{}\n{}\n{}\n", header(), row("A", "1号機"), fields.join(","));
        let result = parse_measurements(&body);
        match result {
            Err(ReportError::CsvParse { message, line }) => {
                assert!(message.contains("expected 56 fields, found 55"), "{message}");
                assert_eq!(line, 3);
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_fails_on_bad_slot_value() {
        let mut fields = row_fields("A", "1号機");
        fields[10] = "おかしい".to_owned();
        let body = format!("{}\n{}\n", header(), fields.join(","));
        let result = parse_measurements(&body);
        assert!(matches!(result, Err(ReportError::CsvParse { line: 2, .. })));
    }

    #[test]
    fn test_parse_strips_quotes_and_whitespace() -> Result<(), ReportError> {
        let quoted: Vec<String> =
            row_fields("柏崎刈羽", "1号機").iter().map(|field| format!("\"{field}\"")).collect();
        let body = format!("{}\n{}\n", header(), quoted.join(","));
        let measurements = parse_measurements(&body)?;
        assert_eq!(measurements[0].plant_name, "柏崎刈羽");
        Ok(())
    }

    fn header() -> String {
        (0..FIELD_COUNT).map(|i| format!("列{i}")).collect::<Vec<_>>().join(",")
    }

    fn row(plant_name: &str, unit_name: &str) -> String {
        row_fields(plant_name, unit_name).join(",")
    }

    /// A well-formed 56-field data row: every slot reads 550,000 kWh.
    fn row_fields(plant_name: &str, unit_name: &str) -> Vec<String> {
        let mut fields = vec![
            "3".to_owned(),
            "東京".to_owned(),
            plant_name.to_owned(),
            unit_name.to_owned(),
            "原子力".to_owned(),
            "2024/01/10".to_owned(),
        ];
        fields.extend(std::iter::repeat_n("550000".to_owned(), SLOTS_PER_DAY));
        fields.push("26400000".to_owned());
        fields.push("2024/01/11 09:00:00".to_owned());
        fields
    }
}
