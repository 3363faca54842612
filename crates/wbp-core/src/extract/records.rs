//! Field parsing for meeting and training school blocks.
//!
//! A block is the text following one "Title of the Meeting" or "Title of the
//! Training" header up to the next header.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::report::{MeetingRecord, MeetingType, TrainingSchoolRecord};

use super::rules::patterns::*;
use super::rules::{parse_amount, parse_date, AmountExtractor, FieldExtractor};

/// Inclusiveness Target Countries, used when a block carries no ITC flag.
const ITC_COUNTRIES: &[&str] = &[
    "Albania",
    "Bosnia and Herzegovina",
    "Bulgaria",
    "Croatia",
    "Cyprus",
    "Czech Republic",
    "Czechia",
    "Estonia",
    "Greece",
    "Hungary",
    "Latvia",
    "Lithuania",
    "Malta",
    "Moldova",
    "Montenegro",
    "North Macedonia",
    "Poland",
    "Portugal",
    "Romania",
    "Serbia",
    "Slovakia",
    "Slovenia",
    "Turkey",
    "Türkiye",
    "Ukraine",
];

/// Line prefixes that end a wrapped title.
const FIELD_LABELS: &[&str] = &[
    "Grant Period",
    "Meeting Type",
    "Location",
    "Start Date",
    "End Date",
    "Description",
    "Output(s)",
    "Institution",
    "Host Institution",
    "Total",
    "Number of",
];

/// Why a block produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlockRejection {
    /// No parseable start date; the block is not a complete record.
    MissingStartDate,
}

/// Parsed block plus non-fatal issues.
pub(crate) struct ParsedBlock<T> {
    pub record: T,
    pub warnings: Vec<String>,
}

pub(crate) fn parse_meeting_block(
    number: u32,
    block: &str,
    grant_period: u8,
) -> Result<ParsedBlock<MeetingRecord>, BlockRejection> {
    let block = strip_page_markers(block);
    let mut warnings = Vec::new();

    let title = first_line(&block).unwrap_or_else(|| format!("Meeting {}", number));
    let (start_date, end_date) = date_range(&block, &title, &mut warnings)?;
    let place = place(&block);

    let meeting_type = MEETING_TYPE_FIELD
        .captures(&block)
        .map(|caps| MeetingType::from_label(&caps[1]))
        .unwrap_or(MeetingType::Unknown);

    let record = MeetingRecord {
        meeting_number: number,
        title,
        meeting_type,
        start_date,
        end_date,
        location: place.city,
        country: place.country,
        itc_country: place.itc,
        planned_cost: block_cost(&block, &MEETING_COST),
        expected_participants: capture_count(&EXPECTED_PARTICIPANTS, &block, 1),
        expected_reimbursed: capture_count(&EXPECTED_REIMBURSED, &block, 1),
        grant_period,
        description: labelled_text(
            &block,
            &DESCRIPTION_LABEL,
            &[&*OUTPUTS_LABEL, &*LOCATION_LABEL, &*START_DATE_FIELD, &*TOTAL_COST_FIELD],
        ),
        expected_outputs: labelled_text(
            &block,
            &OUTPUTS_LABEL,
            &[&*LOCATION_LABEL, &*START_DATE_FIELD, &*TOTAL_COST_FIELD],
        ),
    };

    Ok(ParsedBlock { record, warnings })
}

pub(crate) fn parse_training_block(
    number: u32,
    block: &str,
    grant_period: u8,
) -> Result<ParsedBlock<TrainingSchoolRecord>, BlockRejection> {
    let block = strip_page_markers(block);
    let mut warnings = Vec::new();

    let title = wrapped_title(&block).unwrap_or_else(|| format!("Training School {}", number));
    let (start_date, end_date) = date_range(&block, &title, &mut warnings)?;
    let place = place(&block);

    let (expected_trainers, expected_trainees) = match TRAINERS_TRAINEES.captures(&block) {
        Some(caps) => (
            caps[1].parse().unwrap_or(0),
            caps[2].parse().unwrap_or(0),
        ),
        None => (
            capture_count(&TRAINERS_SINGLE, &block, 1),
            capture_count(&TRAINEES_SINGLE, &block, 1),
        ),
    };

    let record = TrainingSchoolRecord {
        school_number: number,
        title,
        institution: INSTITUTION_FIELD
            .captures(&block)
            .map(|caps| caps[1].trim().to_string())
            .filter(|s| !s.is_empty()),
        location: place.city,
        country: place.country,
        itc_country: place.itc,
        start_date,
        end_date,
        planned_cost: block_cost(&block, &TRAINING_COST),
        expected_trainers,
        expected_trainees,
        grant_period,
        description: labelled_text(
            &block,
            &DESCRIPTION_LABEL,
            &[&*TOPICS_LABEL, &*LOCATION_LABEL, &*START_DATE_FIELD, &*TOTAL_COST_FIELD],
        ),
        topics: labelled_text(
            &block,
            &TOPICS_LABEL,
            &[&*LOCATION_LABEL, &*START_DATE_FIELD, &*TOTAL_COST_FIELD],
        ),
    };

    Ok(ParsedBlock { record, warnings })
}

fn strip_page_markers(block: &str) -> String {
    PAGE_MARKER.replace_all(block, "").into_owned()
}

fn first_line(block: &str) -> Option<String> {
    block
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Title spread over the first lines of the block. A lone "School" line is
/// the tail of the header itself and is skipped.
fn wrapped_title(block: &str) -> Option<String> {
    let mut parts = Vec::new();

    for line in block.lines().take(5) {
        let line = line.trim();
        if line.is_empty() {
            if parts.is_empty() {
                continue;
            }
            break;
        }
        if line.eq_ignore_ascii_case("school") {
            continue;
        }
        if FIELD_LABELS.iter().any(|label| line.starts_with(label)) {
            break;
        }
        parts.push(line);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn date_range(
    block: &str,
    title: &str,
    warnings: &mut Vec<String>,
) -> Result<(NaiveDate, NaiveDate), BlockRejection> {
    let start = START_DATE_FIELD
        .captures(block)
        .and_then(|caps| parse_date(&caps[1]))
        .or_else(|| parse_date(block))
        .ok_or(BlockRejection::MissingStartDate)?;

    let end = END_DATE_FIELD
        .captures(block)
        .and_then(|caps| parse_date(&caps[1]))
        .unwrap_or(start);

    if end < start {
        warnings.push(format!(
            "{}: end date {} precedes start date {}, using start date",
            title, end, start
        ));
        return Ok((start, start));
    }

    Ok((start, end))
}

struct Place {
    city: String,
    country: String,
    itc: bool,
}

fn place(block: &str) -> Place {
    if let Some(caps) = LOCATION_ITC.captures(block) {
        let (city, country) = split_city_country(caps[1].trim());
        return Place {
            city,
            country,
            itc: caps[2].eq_ignore_ascii_case("yes"),
        };
    }

    match LOCATION_LINE.captures(block) {
        Some(caps) => {
            let (city, country) = split_city_country(caps[1].trim());
            let itc = ITC_COUNTRIES.contains(&country.as_str());
            Place { city, country, itc }
        }
        None => Place {
            city: "Unknown".to_string(),
            country: "Unknown".to_string(),
            itc: false,
        },
    }
}

/// Split "City (Country)" or "City / Country".
fn split_city_country(location: &str) -> (String, String) {
    if let Some(caps) = CITY_COUNTRY_PAREN.captures(location) {
        return (caps[1].trim().to_string(), caps[2].trim().to_string());
    }
    match location.rsplit_once('/') {
        Some((city, country)) if !country.trim().is_empty() => {
            (city.trim().to_string(), country.trim().to_string())
        }
        _ => (location.to_string(), "Unknown".to_string()),
    }
}

/// Labelled cost, then a generic "Total Cost" label, then the first line
/// ending in an amount.
fn block_cost(block: &str, labelled: &Regex) -> Decimal {
    if let Some(caps) = labelled.captures(block).or_else(|| TOTAL_COST_FIELD.captures(block)) {
        return parse_amount(&caps[1]);
    }

    let extractor = AmountExtractor::new();
    block
        .lines()
        .map(str::trim_end)
        .find_map(|line| {
            extractor
                .extract_all(line)
                .pop()
                .filter(|m| m.position.map(|(_, end)| end) == Some(line.len()))
                .map(|m| m.value)
        })
        .unwrap_or_else(|| Decimal::new(0, 2))
}

fn capture_count(regex: &Regex, block: &str, group: usize) -> u32 {
    regex
        .captures(block)
        .and_then(|caps| caps.get(group))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Text after `label` up to the first of `stops` (or the block end).
fn labelled_text(block: &str, label: &Regex, stops: &[&Regex]) -> Option<String> {
    let start = label.find(block)?.end();
    let rest = &block[start..];
    let end = stops
        .iter()
        .filter_map(|stop| stop.find(rest).map(|m| m.start()))
        .min()
        .unwrap_or(rest.len());

    let text = rest[..end].split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MEETING: &str = "Kick-off Meeting\n\
        Meeting Type(s) Management Committee, Core Group\n\
        Location Lisbon (Portugal) ITC Yes\n\
        Start Date 2024-04-24\n\
        End Date 2024-04-26\n\
        Total number of expected 45\n\
        Number of participants expected to be reimbursed 30\n\
        Description Plan of the first year.\n\
        Output(s) Minutes and action list\n\
        Total cost of the meeting (EUR) 28,500.00\n";

    #[test]
    fn test_meeting_block_fields() {
        let parsed = parse_meeting_block(1, MEETING, 4).unwrap();
        let m = parsed.record;
        assert_eq!(m.title, "Kick-off Meeting");
        assert_eq!(m.meeting_type, MeetingType::ManagementCommittee);
        assert_eq!(m.location, "Lisbon");
        assert_eq!(m.country, "Portugal");
        assert!(m.itc_country);
        assert_eq!(m.start_date, NaiveDate::from_ymd_opt(2024, 4, 24).unwrap());
        assert_eq!(m.end_date, NaiveDate::from_ymd_opt(2024, 4, 26).unwrap());
        assert_eq!(m.expected_participants, 45);
        assert_eq!(m.expected_reimbursed, 30);
        assert_eq!(m.planned_cost, Decimal::new(2850000, 2));
        assert_eq!(m.description.as_deref(), Some("Plan of the first year."));
        assert_eq!(m.expected_outputs.as_deref(), Some("Minutes and action list"));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_block_without_start_date_is_rejected() {
        let block = "Orphan\nLocation Nowhere (Atlantis) ITC No\nTotal cost of the meeting (EUR) 10.00\n";
        assert_eq!(
            parse_meeting_block(3, block, 2).err(),
            Some(BlockRejection::MissingStartDate)
        );
    }

    #[test]
    fn test_end_before_start_is_clamped() {
        let block = "Swapped\nStart Date 10/05/2023\nEnd Date 08/05/2023\n";
        let parsed = parse_meeting_block(1, block, 3).unwrap();
        assert_eq!(parsed.record.end_date, parsed.record.start_date);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_legacy_location_line_uses_itc_country_list() {
        let block = "WG meeting\nMeeting location Warsaw / Poland\nStart Date 01/03/2021\n";
        let m = parse_meeting_block(2, block, 1).unwrap().record;
        assert_eq!(m.location, "Warsaw");
        assert_eq!(m.country, "Poland");
        assert!(m.itc_country);
        assert_eq!(m.end_date, m.start_date);
        assert_eq!(m.planned_cost, Decimal::ZERO);
    }

    #[test]
    fn test_malformed_cost_is_zero() {
        let block = "Odd\nStart Date 2024-01-10\nTotal cost of the meeting (EUR) 1 234..56\n";
        let m = parse_meeting_block(1, block, 5).unwrap().record;
        assert_eq!(m.planned_cost, Decimal::ZERO);
    }

    #[test]
    fn test_cost_from_line_end_amount() {
        let block = "Unlabelled\nStart Date 2024-01-10\nBudget 12,345.67\n";
        let m = parse_meeting_block(1, block, 5).unwrap().record;
        assert_eq!(m.planned_cost, Decimal::new(1234567, 2));
    }

    #[test]
    fn test_training_block_fields() {
        let block = "Summer School on Explainable\n\
            Credit Risk Models\n\
            School\n\
            Host Institution University of Pavia\n\
            Location Pavia (Italy) ITC No\n\
            Start Date 2024-07-01\n\
            End Date 2024-07-05\n\
            Total number of expected trainers/trainees 8 25\n\
            Total cost of the Training School (EUR) 35 000.00\n";

        let s = parse_training_block(1, block, 5).unwrap().record;
        assert_eq!(s.title, "Summer School on Explainable Credit Risk Models");
        assert_eq!(s.institution.as_deref(), Some("University of Pavia"));
        assert_eq!(s.location, "Pavia");
        assert_eq!(s.country, "Italy");
        assert!(!s.itc_country);
        assert_eq!(s.expected_trainers, 8);
        assert_eq!(s.expected_trainees, 25);
        assert_eq!(s.planned_cost, Decimal::new(3500000, 2));
    }

    #[test]
    fn test_split_city_country() {
        assert_eq!(
            split_city_country("Cluj-Napoca (Romania)"),
            ("Cluj-Napoca".to_string(), "Romania".to_string())
        );
        assert_eq!(
            split_city_country("Berlin / Germany"),
            ("Berlin".to_string(), "Germany".to_string())
        );
        assert_eq!(
            split_city_country("Online"),
            ("Online".to_string(), "Unknown".to_string())
        );
    }
}
