use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sheet column names, matched case-sensitively against the header row.
pub mod columns {
    pub const COURSE: &str = "COURSE";
    pub const TEST_DATE: &str = "TEST DATE";
    pub const RANK: &str = "RANK";
    pub const ROLL_NO: &str = "ROLL NO";
    pub const STUDENT_NAME: &str = "STUDENT NAME";
    pub const TOTAL_QUESTIONS: &str = "TQ";
    pub const ATTEMPTED: &str = "TA";
    pub const RIGHT: &str = "TR";
    pub const WRONG: &str = "TW";
    pub const LEFT: &str = "TL";
    pub const PHYSICS_RIGHT: &str = "PR";
    pub const PHYSICS_WRONG: &str = "PW";
    pub const CHEMISTRY_RIGHT: &str = "CR";
    pub const CHEMISTRY_WRONG: &str = "CW";
    pub const BOTANY_RIGHT: &str = "BR";
    pub const BOTANY_WRONG: &str = "BW";
    pub const ZOOLOGY_RIGHT: &str = "ZR";
    pub const ZOOLOGY_WRONG: &str = "ZW";
    pub const TOTAL_MARKS: &str = "Total MARKS";
    pub const MARKS_PERCENTAGE: &str = "MARKS%";
    pub const WRONG_PERCENTAGE: &str = "W%";
    pub const PERCENTILE: &str = "PERCENTILE";
    pub const BATCH: &str = "BATCH";
    pub const BRANCH: &str = "BRANCH";

    pub const TEST_TYPE: &str = "TEST TYPE";
    pub const EXAM_ID: &str = "EXAM ID";
    pub const BATCH_YEAR: &str = "BATCH YEAR";
    pub const BATCH_CODE: &str = "BATCH CODE";
    pub const TOTAL_STUDENTS: &str = "TOTAL STUDENTS";

    /// Columns every uploaded sheet is expected to carry.
    pub const EXPECTED: [&str; 24] = [
        COURSE,
        TEST_DATE,
        RANK,
        ROLL_NO,
        STUDENT_NAME,
        TOTAL_QUESTIONS,
        ATTEMPTED,
        RIGHT,
        WRONG,
        LEFT,
        PHYSICS_RIGHT,
        PHYSICS_WRONG,
        CHEMISTRY_RIGHT,
        CHEMISTRY_WRONG,
        BOTANY_RIGHT,
        BOTANY_WRONG,
        ZOOLOGY_RIGHT,
        ZOOLOGY_WRONG,
        TOTAL_MARKS,
        MARKS_PERCENTAGE,
        WRONG_PERCENTAGE,
        PERCENTILE,
        BATCH,
        BRANCH,
    ];

    /// Columns that override derived values when present.
    pub const OPTIONAL: [&str; 5] = [TEST_TYPE, EXAM_ID, BATCH_YEAR, BATCH_CODE, TOTAL_STUDENTS];
}

/// Which result collection an importer writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCollection {
    ExamResults,
    CompetitiveExamResults,
}

impl ResultCollection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ExamResults => "exam results",
            Self::CompetitiveExamResults => "competitive exam results",
        }
    }

    pub const fn import_path(self) -> &'static str {
        match self {
            Self::ExamResults => "/api/v1/exam-results/import",
            Self::CompetitiveExamResults => "/api/v1/competitive-exam-results/import",
        }
    }

    pub const fn template_path(self) -> &'static str {
        match self {
            Self::ExamResults => "/api/v1/exam-results/import/template",
            Self::CompetitiveExamResults => "/api/v1/competitive-exam-results/import/template",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestType {
    SurpriseTest,
    ClassroomTest,
}

impl TestType {
    /// Prefix used when an exam id has to be synthesized.
    pub const fn exam_prefix(self) -> &'static str {
        match self {
            Self::SurpriseTest => "ST",
            Self::ClassroomTest => "CT",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SurpriseTest => "SURPRISE_TEST",
            Self::ClassroomTest => "CLASSROOM_TEST",
        }
    }

    /// Parses an explicit `TEST TYPE` cell.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "SURPRISE_TEST" | "ST" => Some(Self::SurpriseTest),
            "CLASSROOM_TEST" | "CT" => Some(Self::ClassroomTest),
            _ => None,
        }
    }

    /// Course names mentioning "surprise" are surprise tests; everything else
    /// is a classroom test.
    pub fn infer_from_course(course: &str) -> Self {
        if course.to_lowercase().contains("surprise") {
            Self::SurpriseTest
        } else {
            Self::ClassroomTest
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Question counts and marks for one student in one test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub total_questions: u32,
    pub attempted: u32,
    pub right: u32,
    pub wrong: u32,
    pub left: u32,
    pub physics_right: u32,
    pub physics_wrong: u32,
    pub chemistry_right: u32,
    pub chemistry_wrong: u32,
    pub botany_right: u32,
    pub botany_wrong: u32,
    pub zoology_right: u32,
    pub zoology_wrong: u32,
    pub total_marks: f64,
    pub marks_percentage: f64,
    pub wrong_percentage: f64,
    pub percentile: f64,
}

/// A validated result row, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub course: String,
    pub roll_no: String,
    pub student_name: String,
    pub test_date: NaiveDate,
    pub rank: u32,
    #[serde(flatten)]
    pub scores: ScoreBreakdown,
    pub batch: String,
    pub branch: String,
    pub test_type: TestType,
    pub exam_id: String,
    pub batch_year: i32,
    pub batch_code: String,
    pub total_students: u32,
}

/// Validation failure for a single data row. Rows are numbered from 1,
/// excluding the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    #[serde(rename = "row")]
    pub row_number: usize,
    #[serde(rename = "error")]
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row_number, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parses_common_spellings() {
        assert_eq!(TestType::parse("SURPRISE_TEST"), Some(TestType::SurpriseTest));
        assert_eq!(TestType::parse("surprise test"), Some(TestType::SurpriseTest));
        assert_eq!(TestType::parse("st"), Some(TestType::SurpriseTest));
        assert_eq!(TestType::parse("Classroom-Test"), Some(TestType::ClassroomTest));
        assert_eq!(TestType::parse("CT"), Some(TestType::ClassroomTest));
        assert_eq!(TestType::parse("weekly"), None);
    }

    #[test]
    fn test_type_inference_is_case_insensitive() {
        assert_eq!(
            TestType::infer_from_course("Surprise Test - Physics"),
            TestType::SurpriseTest
        );
        assert_eq!(
            TestType::infer_from_course("NEET SURPRISE round"),
            TestType::SurpriseTest
        );
        assert_eq!(
            TestType::infer_from_course("Classroom Test"),
            TestType::ClassroomTest
        );
    }

    #[test]
    fn row_error_serializes_with_row_and_error_keys() {
        let error = RowError {
            row_number: 3,
            message: "missing ROLL NO".to_string(),
        };
        let value = serde_json::to_value(&error).expect("serializes");
        assert_eq!(value, serde_json::json!({ "row": 3, "error": "missing ROLL NO" }));
    }

    #[test]
    fn collections_expose_distinct_routes() {
        assert_ne!(
            ResultCollection::ExamResults.import_path(),
            ResultCollection::CompetitiveExamResults.import_path()
        );
        assert!(ResultCollection::CompetitiveExamResults
            .template_path()
            .starts_with(ResultCollection::CompetitiveExamResults.import_path()));
    }
}
