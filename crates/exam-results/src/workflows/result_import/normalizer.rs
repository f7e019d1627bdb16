use super::decoder::RawRow;
use super::domain::{columns, ExamResult, RowError, ScoreBreakdown, TestType};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%b-%Y", "%d %b %Y",
];

static FOUR_DIGIT_YEAR: OnceLock<Option<Regex>> = OnceLock::new();

/// A row that passed validation. `declared_total_students` is `None` when the
/// sheet left the cohort size to be derived.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedRow {
    pub(crate) record: ExamResult,
    pub(crate) declared_total_students: Option<u32>,
}

/// Turns raw rows into typed results, applying the fallback rules for
/// derived fields.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Normalizer {
    fallback_year: i32,
}

impl Normalizer {
    /// `fallback_year` is used as the batch year when neither the sheet nor
    /// the batch string supplies one.
    pub(crate) fn new(fallback_year: i32) -> Self {
        Self { fallback_year }
    }

    pub(crate) fn normalize(&self, row: &RawRow) -> Result<NormalizedRow, RowError> {
        let course = row.value(columns::COURSE);
        let roll_no = row.value(columns::ROLL_NO);
        let student_name = row.value(columns::STUDENT_NAME);
        let rank = row.value(columns::RANK).and_then(parse_rank);
        let test_date = row.value(columns::TEST_DATE).and_then(parse_test_date);

        let mut invalid = Vec::new();
        if course.is_none() {
            invalid.push(columns::COURSE);
        }
        if roll_no.is_none() {
            invalid.push(columns::ROLL_NO);
        }
        if student_name.is_none() {
            invalid.push(columns::STUDENT_NAME);
        }
        if rank.is_none() {
            invalid.push(columns::RANK);
        }
        if test_date.is_none() {
            invalid.push(columns::TEST_DATE);
        }

        let mut problems = Vec::new();
        if !invalid.is_empty() {
            problems.push(format!(
                "missing or invalid required fields: {}",
                invalid.join(", ")
            ));
        }

        let explicit_test_type = match row.value(columns::TEST_TYPE) {
            Some(raw) => match TestType::parse(raw) {
                Some(test_type) => Some(test_type),
                None => {
                    problems.push(format!("unrecognized {} '{raw}'", columns::TEST_TYPE));
                    None
                }
            },
            None => None,
        };

        let (Some(course), Some(roll_no), Some(student_name), Some(rank), Some(test_date)) =
            (course, roll_no, student_name, rank, test_date)
        else {
            return Err(row_error(row, problems));
        };
        if !problems.is_empty() {
            return Err(row_error(row, problems));
        }

        let batch = row.value(columns::BATCH).unwrap_or_default();
        let test_type = explicit_test_type.unwrap_or_else(|| TestType::infer_from_course(course));
        let exam_id = row
            .value(columns::EXAM_ID)
            .map(str::to_string)
            .unwrap_or_else(|| synthesize_exam_id(test_type, test_date, batch));
        let batch_year = row
            .value(columns::BATCH_YEAR)
            .and_then(|raw| raw.parse::<i32>().ok())
            .or_else(|| year_in_batch(batch))
            .unwrap_or(self.fallback_year);
        let batch_code = row
            .value(columns::BATCH_CODE)
            .unwrap_or(batch)
            .to_string();
        let declared_total_students = row.value(columns::TOTAL_STUDENTS).and_then(parse_count);

        let record = ExamResult {
            course: course.to_string(),
            roll_no: roll_no.to_string(),
            student_name: student_name.to_string(),
            test_date,
            rank,
            scores: scores(row),
            batch: batch.to_string(),
            branch: row.value(columns::BRANCH).unwrap_or_default().to_string(),
            test_type,
            exam_id,
            batch_year,
            batch_code,
            total_students: declared_total_students.unwrap_or(0),
        };

        Ok(NormalizedRow {
            record,
            declared_total_students,
        })
    }
}

fn row_error(row: &RawRow, problems: Vec<String>) -> RowError {
    RowError {
        row_number: row.row_number(),
        message: problems.join("; "),
    }
}

fn scores(row: &RawRow) -> ScoreBreakdown {
    let count = |column: &str| lenient(row, column, parse_count);
    let decimal = |column: &str| lenient(row, column, parse_decimal);

    ScoreBreakdown {
        total_questions: count(columns::TOTAL_QUESTIONS),
        attempted: count(columns::ATTEMPTED),
        right: count(columns::RIGHT),
        wrong: count(columns::WRONG),
        left: count(columns::LEFT),
        physics_right: count(columns::PHYSICS_RIGHT),
        physics_wrong: count(columns::PHYSICS_WRONG),
        chemistry_right: count(columns::CHEMISTRY_RIGHT),
        chemistry_wrong: count(columns::CHEMISTRY_WRONG),
        botany_right: count(columns::BOTANY_RIGHT),
        botany_wrong: count(columns::BOTANY_WRONG),
        zoology_right: count(columns::ZOOLOGY_RIGHT),
        zoology_wrong: count(columns::ZOOLOGY_WRONG),
        total_marks: decimal(columns::TOTAL_MARKS),
        marks_percentage: decimal(columns::MARKS_PERCENTAGE),
        wrong_percentage: decimal(columns::WRONG_PERCENTAGE),
        percentile: decimal(columns::PERCENTILE),
    }
}

/// Optional numeric cells fall back to zero. A present but unparseable value
/// is logged so coerced data can be traced.
fn lenient<T: Default>(row: &RawRow, column: &str, parse: fn(&str) -> Option<T>) -> T {
    match row.value(column) {
        Some(raw) => parse(raw).unwrap_or_else(|| {
            debug!(
                row = row.row_number(),
                column, value = raw, "unparseable numeric cell defaulted to zero"
            );
            T::default()
        }),
        None => T::default(),
    }
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_count(raw: &str) -> Option<u32> {
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }

    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0 && *value <= f64::from(u32::MAX))
        .map(|value| value.trunc() as u32)
}

fn parse_rank(raw: &str) -> Option<u32> {
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }

    raw.parse::<f64>()
        .ok()
        .filter(|value| *value >= 0.0 && *value <= f64::from(u32::MAX) && value.fract() == 0.0)
        .map(|value| value as u32)
}

fn parse_test_date(raw: &str) -> Option<NaiveDate> {
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

fn synthesize_exam_id(test_type: TestType, test_date: NaiveDate, batch: &str) -> String {
    let batch_slug = batch.split_whitespace().collect::<Vec<_>>().join("-");
    format!(
        "{}-{}-{}",
        test_type.exam_prefix(),
        test_date.format("%Y-%m-%d"),
        batch_slug
    )
}

fn year_in_batch(batch: &str) -> Option<i32> {
    FOUR_DIGIT_YEAR
        .get_or_init(|| Regex::new(r"\d{4}").ok())
        .as_ref()?
        .find(batch)
        .and_then(|found| found.as_str().parse().ok())
}
