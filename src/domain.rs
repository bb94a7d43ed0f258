//! Domain models: differentiation intents, the new-exercise form, generated
//! sections and the per-request outcome.

use serde::{Deserialize, Serialize};

use crate::util::is_blank;

/// What kind of transformation is applied to an existing exercise?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DifferentiationIntent {
  /// Easy, normal and hard version of the same exercise.
  MakeVariants,
  MakeEasier,
  MakeHarder,
  /// Same structure, new numbers/names/data.
  RandomizeData,
  /// Same learning goal in a different situation.
  ChangeContext,
  /// The user describes the change in free text.
  Custom,
}

impl DifferentiationIntent {
  pub const ALL: [DifferentiationIntent; 6] = [
    DifferentiationIntent::MakeVariants,
    DifferentiationIntent::MakeEasier,
    DifferentiationIntent::MakeHarder,
    DifferentiationIntent::RandomizeData,
    DifferentiationIntent::ChangeContext,
    DifferentiationIntent::Custom,
  ];

  pub fn requires_custom_text(self) -> bool {
    matches!(self, DifferentiationIntent::Custom)
  }

  /// Display entry shown next to the intent picker.
  pub fn info(self) -> IntentInfo {
    let (title, description, icon) = match self {
      DifferentiationIntent::MakeVariants => (
        "🎯 Maak 3 Varianten",
        "Genereer makkelijke, normale en moeilijke versie",
        "🎯",
      ),
      DifferentiationIntent::MakeEasier => (
        "🟢 Maak Makkelijker",
        "Vereenvoudig de opdracht voor zwakkere leerlingen",
        "🟢",
      ),
      DifferentiationIntent::MakeHarder => (
        "🔴 Maak Moeilijker",
        "Uitdagendere versie voor sterke leerlingen",
        "🔴",
      ),
      DifferentiationIntent::RandomizeData => (
        "🔢 Nieuwe Getallen/Data",
        "Behoud de structuur, verander alleen de cijfers/gegevens",
        "🔢",
      ),
      DifferentiationIntent::ChangeContext => (
        "🔄 Andere Context",
        "Zelfde leerdoel, maar in een andere situatie",
        "🔄",
      ),
      DifferentiationIntent::Custom => (
        "✏️ Eigen Wens",
        "Beschrijf zelf wat je wilt aanpassen",
        "✏️",
      ),
    };
    IntentInfo { intent: self, title, description, icon }
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct IntentInfo {
  pub intent: DifferentiationIntent,
  pub title: &'static str,
  pub description: &'static str,
  pub icon: &'static str,
}

/// The two screens reachable from mode selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  New,
  Existing,
}

/// Form for a from-scratch exercise. `additional_info` is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewExerciseSpec {
  pub subject: String,
  pub topic: String,
  pub grade_level: String,
  pub exercise_type: String,
  pub additional_info: String,
}

impl NewExerciseSpec {
  /// All four required fields carry visible text.
  pub fn is_complete(&self) -> bool {
    ![&self.subject, &self.topic, &self.grade_level, &self.exercise_type]
      .iter()
      .any(|f| is_blank(f))
  }
}

/// Partial update of the new-exercise form; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecPatch {
  pub subject: Option<String>,
  pub topic: Option<String>,
  pub grade_level: Option<String>,
  pub exercise_type: Option<String>,
  pub additional_info: Option<String>,
}

impl SpecPatch {
  pub fn apply_to(self, spec: &mut NewExerciseSpec) {
    if let Some(v) = self.subject { spec.subject = v; }
    if let Some(v) = self.topic { spec.topic = v; }
    if let Some(v) = self.grade_level { spec.grade_level = v; }
    if let Some(v) = self.exercise_type { spec.exercise_type = v; }
    if let Some(v) = self.additional_info { spec.additional_info = v; }
  }
}

/// The four addressable parts of a generated exercise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSections {
  pub easy: String,
  pub normal: String,
  pub hard: String,
  pub answer_key: String,
}

/// State of the most recent generation request on a screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum RequestOutcome<T> {
  Idle,
  Loading,
  Success(T),
  Failure(String),
}

impl<T> Default for RequestOutcome<T> {
  fn default() -> Self { RequestOutcome::Idle }
}

impl<T> RequestOutcome<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, RequestOutcome::Loading)
  }
}
