use async_trait::async_trait;
use serde::Deserialize;

use exam_core::model::{
    ChoiceOption, MediaUri, OptionId, Question, QuestionId, Section, SectionId, TestDefinition,
    TestId,
};

use crate::error::CatalogError;

/// Which catalog serves a given attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSource {
    /// Deterministic generated definition, no backend required.
    Mock,
    /// The tenant's live test-catalog API.
    Live,
}

/// Read-side boundary to the test catalog.
#[async_trait]
pub trait TestCatalog: Send + Sync {
    /// Fetch a full test definition by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids and transport or
    /// validation failures otherwise.
    async fn load_test(&self, test_id: &TestId) -> Result<TestDefinition, CatalogError>;
}

//
// ─── WIRE DTOS ─────────────────────────────────────────────────────────────────
//

// The backend speaks camelCase JSON; domain construction re-validates every
// field, so a malformed catalog response surfaces as `CatalogError` instead
// of leaking into the attempt engine.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestDefinitionDto {
    id: String,
    title: String,
    duration_minutes: u32,
    sections: Vec<SectionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionDto {
    id: String,
    name: String,
    questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDto {
    id: String,
    text: String,
    image_url: Option<String>,
    options: Vec<OptionDto>,
    marks: f64,
    #[serde(default)]
    negative_marks: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionDto {
    id: String,
    text: String,
    image_url: Option<String>,
}

fn media_from_dto(image_url: Option<String>) -> Option<MediaUri> {
    // A broken image link downgrades to "no image" rather than failing the
    // whole fetch; the question text still renders.
    image_url.and_then(|raw| MediaUri::from_url(raw).ok())
}

impl TestDefinitionDto {
    fn into_domain(self) -> Result<TestDefinition, CatalogError> {
        let mut sections = Vec::with_capacity(self.sections.len());
        for section in self.sections {
            let mut questions = Vec::with_capacity(section.questions.len());
            for question in section.questions {
                let options = question
                    .options
                    .into_iter()
                    .map(|option| {
                        ChoiceOption::new(
                            OptionId::new(option.id),
                            option.text,
                            media_from_dto(option.image_url),
                        )
                    })
                    .collect();
                questions.push(Question::multiple_choice(
                    QuestionId::new(question.id),
                    question.text,
                    media_from_dto(question.image_url),
                    options,
                    question.marks,
                    question.negative_marks,
                )?);
            }
            sections.push(Section::new(
                SectionId::new(section.id),
                section.name,
                questions,
            ));
        }

        Ok(TestDefinition::new(
            TestId::new(self.id),
            self.title,
            self.duration_minutes,
            sections,
        )?)
    }
}

//
// ─── HTTP CATALOG ──────────────────────────────────────────────────────────────
//

/// Catalog backed by the tenant's test API.
#[derive(Clone)]
pub struct HttpTestCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTestCatalog {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TestCatalog for HttpTestCatalog {
    async fn load_test(&self, test_id: &TestId) -> Result<TestDefinition, CatalogError> {
        let url = format!("{}/tests/{}", self.base_url, test_id);
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status()));
        }

        let dto: TestDefinitionDto = response.json().await?;
        dto.into_domain()
    }
}

//
// ─── MOCK CATALOG ──────────────────────────────────────────────────────────────
//

pub const MOCK_SECTION_COUNT: usize = 3;
pub const MOCK_QUESTIONS_PER_SECTION: usize = 10;
pub const MOCK_OPTIONS_PER_QUESTION: usize = 4;
pub const MOCK_DURATION_MINUTES: u32 = 30;

const MOCK_MARKS: f64 = 4.0;
const MOCK_NEGATIVE_MARKS: f64 = 1.0;

/// Deterministic, seed-free generated definition for demos and tests.
///
/// Every call yields the identical definition: fixed counts, fixed 1-based
/// ids (`section-2`, `q-2-5`, `opt-2-5-3`), no randomness anywhere, so tests
/// can assert exact question counts and ids.
#[must_use]
pub fn mock_definition(test_id: &TestId) -> TestDefinition {
    let sections = (1..=MOCK_SECTION_COUNT)
        .map(|s| {
            let questions = (1..=MOCK_QUESTIONS_PER_SECTION)
                .map(|q| {
                    let options = (1..=MOCK_OPTIONS_PER_QUESTION)
                        .map(|o| {
                            ChoiceOption::new(
                                OptionId::new(format!("opt-{s}-{q}-{o}")),
                                format!("Option {o}"),
                                None,
                            )
                        })
                        .collect();
                    Question::multiple_choice(
                        QuestionId::new(format!("q-{s}-{q}")),
                        format!("Question {q} of Section {s}"),
                        None,
                        options,
                        MOCK_MARKS,
                        MOCK_NEGATIVE_MARKS,
                    )
                    .expect("mock question constants are valid")
                })
                .collect();
            Section::new(
                SectionId::new(format!("section-{s}")),
                format!("Section {s}"),
                questions,
            )
        })
        .collect();

    TestDefinition::new(
        test_id.clone(),
        format!("Mock Test {test_id}"),
        MOCK_DURATION_MINUTES,
        sections,
    )
    .expect("mock definition constants are valid")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockTestCatalog;

impl MockTestCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TestCatalog for MockTestCatalog {
    async fn load_test(&self, test_id: &TestId) -> Result<TestDefinition, CatalogError> {
        Ok(mock_definition(test_id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionId;

    #[test]
    fn mock_has_fixed_shape() {
        let definition = mock_definition(&TestId::new("demo"));

        assert_eq!(definition.sections().len(), MOCK_SECTION_COUNT);
        for section in definition.sections() {
            assert_eq!(section.questions().len(), MOCK_QUESTIONS_PER_SECTION);
            for question in section.questions() {
                assert_eq!(question.options().len(), MOCK_OPTIONS_PER_QUESTION);
            }
        }
        assert_eq!(definition.duration_minutes(), MOCK_DURATION_MINUTES);
        assert_eq!(definition.question_count(), 30);
    }

    #[test]
    fn mock_places_q_2_5_in_section_2() {
        let definition = mock_definition(&TestId::new("demo"));
        let (section, question) = definition
            .find_question(&QuestionId::new("q-2-5"))
            .expect("q-2-5 exists");

        assert_eq!(section.id().as_str(), "section-2");
        assert_eq!(question.options()[2].id().as_str(), "opt-2-5-3");
    }

    #[test]
    fn mock_is_reproducible() {
        let id = TestId::new("demo");
        assert_eq!(mock_definition(&id), mock_definition(&id));
    }

    #[test]
    fn dto_mapping_validates_definition() {
        let json = serde_json::json!({
            "id": "t-1",
            "title": "Wire Test",
            "durationMinutes": 0,
            "sections": [],
        });
        let dto: TestDefinitionDto = serde_json::from_value(json).unwrap();
        assert!(matches!(
            dto.into_domain(),
            Err(CatalogError::Definition(_))
        ));
    }

    #[test]
    fn dto_mapping_drops_bad_image_links() {
        let json = serde_json::json!({
            "id": "t-1",
            "title": "Wire Test",
            "durationMinutes": 10,
            "sections": [{
                "id": "s-1",
                "name": "One",
                "questions": [{
                    "id": "q-1",
                    "text": "Pick",
                    "imageUrl": "not a url",
                    "options": [
                        { "id": "a", "text": "A", "imageUrl": null },
                        { "id": "b", "text": "B", "imageUrl": "https://cdn.example.com/b.png" },
                    ],
                    "marks": 4.0,
                }],
            }],
        });
        let dto: TestDefinitionDto = serde_json::from_value(json).unwrap();
        let definition = dto.into_domain().unwrap();
        let (_, question) = definition.find_question(&QuestionId::new("q-1")).unwrap();

        assert!(question.image().is_none());
        assert!(question.options()[1].image().is_some());
    }
}
