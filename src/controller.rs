//! Interaction controller: an explicit state machine per client session.
//!
//! ```text
//! ModeSelect --select_mode--> NewExercise | ExistingExercise --back--> ModeSelect
//! ```
//!
//! Inside a screen the outcome moves `Idle -> Loading -> Success | Failure`,
//! and a new submit from any settled state goes straight back to `Loading`.
//!
//! Submitting is split in two so a host never holds the controller while the
//! generation service is working:
//!   1) `begin_submit` validates, builds the prompt and hands out a ticket.
//!   2) `finish_submit` stores the reply, but only if the ticket is still
//!      current. Navigation and `reset` retire outstanding tickets, so a late
//!      reply for a screen that is gone is dropped.
//!
//! Validation and upload problems never touch the outcome; they land in the
//! screen's `notice` until dismissed or superseded.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
  DifferentiationIntent, GeneratedSections, Mode, NewExerciseSpec, RequestOutcome, SpecPatch,
};
use crate::errors::{AppError, AppResult};
use crate::generation::{complete_within, Generator};
use crate::sections::extract_sections;
use crate::templates::{build_creation_prompt, build_prompt, MISSING_CUSTOM_TEXT};
use crate::util::is_blank;

pub const MISSING_SOURCE_OR_INTENT: &str = "Voeg eerst een oefening toe en kies een optie";
pub const WRONG_SCREEN: &str = "Deze actie is niet beschikbaar op dit scherm";

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingExerciseScreen {
  pub source_text: String,
  pub intent: Option<DifferentiationIntent>,
  pub custom_text: String,
  pub outcome: RequestOutcome<String>,
  pub notice: Option<String>,
}

impl ExistingExerciseScreen {
  fn prompt(&self) -> AppResult<String> {
    let intent = match self.intent {
      Some(intent) if !is_blank(&self.source_text) => intent,
      _ => return Err(AppError::Validation(MISSING_SOURCE_OR_INTENT.into())),
    };
    if intent.requires_custom_text() && is_blank(&self.custom_text) {
      return Err(AppError::Validation(MISSING_CUSTOM_TEXT.into()));
    }
    build_prompt(intent, &self.source_text, &self.custom_text)
  }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExerciseScreen {
  pub spec: NewExerciseSpec,
  pub outcome: RequestOutcome<GeneratedSections>,
  pub notice: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
  ModeSelect,
  NewExercise(NewExerciseScreen),
  ExistingExercise(ExistingExerciseScreen),
}

/// A generation handed out by `begin_submit`, to be settled with `finish_submit`.
#[derive(Clone, Debug)]
pub struct PendingGeneration {
  pub ticket: u64,
  pub prompt: String,
}

impl PendingGeneration {
  /// Ask `generator` for this prompt. Never touches the controller, so a host
  /// can call it with the controller unlocked.
  pub async fn run(&self, generator: &dyn Generator, timeout: Duration) -> AppResult<String> {
    complete_within(generator, &self.prompt, timeout).await
  }
}

#[derive(Clone, Debug)]
pub struct InteractionController {
  screen: Screen,
  epoch: u64,
}

impl Default for InteractionController {
  fn default() -> Self { Self::new() }
}

impl InteractionController {
  pub fn new() -> Self {
    Self { screen: Screen::ModeSelect, epoch: 0 }
  }

  pub fn screen(&self) -> &Screen { &self.screen }

  pub fn is_loading(&self) -> bool {
    match &self.screen {
      Screen::ModeSelect => false,
      Screen::NewExercise(s) => s.outcome.is_loading(),
      Screen::ExistingExercise(s) => s.outcome.is_loading(),
    }
  }

  pub fn notice(&self) -> Option<&str> {
    match &self.screen {
      Screen::ModeSelect => None,
      Screen::NewExercise(s) => s.notice.as_deref(),
      Screen::ExistingExercise(s) => s.notice.as_deref(),
    }
  }

  /// Enter a screen with a fresh, empty form.
  pub fn select_mode(&mut self, mode: Mode) -> AppResult<()> {
    if !matches!(self.screen, Screen::ModeSelect) {
      return Err(AppError::Validation(WRONG_SCREEN.into()));
    }
    self.screen = match mode {
      Mode::New => Screen::NewExercise(NewExerciseScreen::default()),
      Mode::Existing => Screen::ExistingExercise(ExistingExerciseScreen::default()),
    };
    self.epoch += 1;
    debug!(target: "differentie_backend", ?mode, "Mode selected");
    Ok(())
  }

  /// Back to mode selection; the current screen and any pending reply are dropped.
  pub fn back(&mut self) {
    self.screen = Screen::ModeSelect;
    self.epoch += 1;
  }

  pub fn set_source_text(&mut self, text: String) -> AppResult<()> {
    self.existing_mut()?.source_text = text;
    Ok(())
  }

  pub fn select_intent(&mut self, intent: DifferentiationIntent) -> AppResult<()> {
    self.existing_mut()?.intent = Some(intent);
    Ok(())
  }

  pub fn set_custom_text(&mut self, text: String) -> AppResult<()> {
    self.existing_mut()?.custom_text = text;
    Ok(())
  }

  pub fn update_spec(&mut self, patch: SpecPatch) -> AppResult<()> {
    patch.apply_to(&mut self.new_mut()?.spec);
    Ok(())
  }

  /// Feed the result of the upload collaborator into the source text.
  pub fn apply_upload(&mut self, result: AppResult<String>) -> AppResult<()> {
    let screen = self.existing_mut()?;
    match result {
      Ok(content) => {
        screen.source_text = content;
        screen.notice = None;
      }
      Err(e) => screen.notice = Some(e.to_string()),
    }
    Ok(())
  }

  /// Clear the inline message. A failed outcome is dismissed along with it.
  /// Ignored while a request is outstanding.
  pub fn dismiss_notice(&mut self) {
    if self.is_loading() {
      return;
    }
    match &mut self.screen {
      Screen::ModeSelect => {}
      Screen::NewExercise(s) => {
        s.notice = None;
        if matches!(s.outcome, RequestOutcome::Failure(_)) {
          s.outcome = RequestOutcome::Idle;
        }
      }
      Screen::ExistingExercise(s) => {
        s.notice = None;
        if matches!(s.outcome, RequestOutcome::Failure(_)) {
          s.outcome = RequestOutcome::Idle;
        }
      }
    }
  }

  /// "Make another": drop the result but keep what was typed into the form.
  /// Only a settled screen can be reset; while loading this is a no-op.
  pub fn reset(&mut self) {
    if self.is_loading() {
      debug!(target: "differentie_backend", "Reset ignored while loading");
      return;
    }
    match &mut self.screen {
      Screen::ModeSelect => return,
      Screen::NewExercise(s) => {
        s.outcome = RequestOutcome::Idle;
        s.notice = None;
      }
      Screen::ExistingExercise(s) => {
        s.outcome = RequestOutcome::Idle;
        s.notice = None;
      }
    }
    self.epoch += 1;
  }

  /// Validate, build the prompt and move to `Loading`.
  ///
  /// Returns `Ok(None)` while a request is already outstanding; the call is
  /// ignored. A failed precondition sets the notice and leaves the outcome
  /// alone.
  pub fn begin_submit(&mut self) -> AppResult<Option<PendingGeneration>> {
    if self.is_loading() {
      debug!(target: "differentie_backend", "Submit ignored while loading");
      return Ok(None);
    }

    let prompt = match &mut self.screen {
      Screen::ModeSelect => return Err(AppError::Validation(WRONG_SCREEN.into())),
      Screen::ExistingExercise(s) => match s.prompt() {
        Ok(p) => {
          s.notice = None;
          s.outcome = RequestOutcome::Loading;
          p
        }
        Err(e) => {
          s.notice = Some(e.to_string());
          return Err(e);
        }
      },
      Screen::NewExercise(s) => match build_creation_prompt(&s.spec) {
        Ok(p) => {
          s.notice = None;
          s.outcome = RequestOutcome::Loading;
          p
        }
        Err(e) => {
          s.notice = Some(e.to_string());
          return Err(e);
        }
      },
    };

    self.epoch += 1;
    info!(target: "differentie_backend", ticket = self.epoch, prompt_len = prompt.len(), "Generation started");
    Ok(Some(PendingGeneration { ticket: self.epoch, prompt }))
  }

  /// Store the settled generation. Returns false when the ticket is stale.
  pub fn finish_submit(&mut self, ticket: u64, result: AppResult<String>) -> bool {
    if ticket != self.epoch || !self.is_loading() {
      warn!(target: "differentie_backend", ticket, current = self.epoch, "Dropping stale generation result");
      return false;
    }

    match &mut self.screen {
      Screen::ModeSelect => return false,
      Screen::ExistingExercise(s) => {
        s.outcome = match result {
          Ok(text) => RequestOutcome::Success(text),
          Err(e) => RequestOutcome::Failure(e.to_string()),
        };
      }
      Screen::NewExercise(s) => {
        s.outcome = match result {
          Ok(text) => RequestOutcome::Success(extract_sections(&text)),
          Err(e) => RequestOutcome::Failure(e.to_string()),
        };
      }
    }
    true
  }

  /// Run a whole submit against `generator` for a host that owns the
  /// controller outright. Shared hosts use `begin_submit`,
  /// `PendingGeneration::run` and `finish_submit` with the lock released in
  /// between. Returns whether a result was stored.
  pub async fn submit(&mut self, generator: &dyn Generator, timeout: Duration) -> AppResult<bool> {
    let Some(pending) = self.begin_submit()? else {
      return Ok(false);
    };
    let result = pending.run(generator, timeout).await;
    Ok(self.finish_submit(pending.ticket, result))
  }

  fn existing_mut(&mut self) -> AppResult<&mut ExistingExerciseScreen> {
    match &mut self.screen {
      Screen::ExistingExercise(s) => Ok(s),
      _ => Err(AppError::Validation(WRONG_SCREEN.into())),
    }
  }

  fn new_mut(&mut self) -> AppResult<&mut NewExerciseScreen> {
    match &mut self.screen {
      Screen::NewExercise(s) => Ok(s),
      _ => Err(AppError::Validation(WRONG_SCREEN.into())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use async_trait::async_trait;

  use crate::errors::GENERATION_FAILED_MESSAGE;
  use crate::generation::ModelHint;
  use crate::sections::FALLBACK_PLACEHOLDER;

  const TIMEOUT: Duration = Duration::from_secs(5);

  /// Replies with a fixed text (or failure) and records every prompt.
  struct Scripted {
    reply: AppResult<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
  }

  impl Scripted {
    fn ok(text: &str) -> Self {
      Self { reply: Ok(text.into()), calls: AtomicUsize::new(0), prompts: Mutex::new(vec![]) }
    }
    fn failing() -> Self {
      Self {
        reply: Err(AppError::generation("HTTP 500")),
        calls: AtomicUsize::new(0),
        prompts: Mutex::new(vec![]),
      }
    }
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
  }

  #[async_trait]
  impl Generator for Scripted {
    async fn complete(&self, prompt: &str, _hint: ModelHint) -> AppResult<String> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.prompts.lock().unwrap().push(prompt.to_string());
      self.reply.clone()
    }
    fn name(&self) -> &'static str { "scripted" }
  }

  fn existing(ctrl: &InteractionController) -> &ExistingExerciseScreen {
    match ctrl.screen() {
      Screen::ExistingExercise(s) => s,
      other => panic!("expected existing exercise screen, got {other:?}"),
    }
  }

  fn new_screen(ctrl: &InteractionController) -> &NewExerciseScreen {
    match ctrl.screen() {
      Screen::NewExercise(s) => s,
      other => panic!("expected new exercise screen, got {other:?}"),
    }
  }

  fn filled_spec() -> SpecPatch {
    SpecPatch {
      subject: Some("Nederlands".into()),
      topic: Some("Werkwoordspelling".into()),
      grade_level: Some("Groep 7".into()),
      exercise_type: Some("Invuloefening".into()),
      additional_info: None,
    }
  }

  #[tokio::test]
  async fn empty_source_never_reaches_the_generator() {
    let gen = Scripted::ok("x");
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.select_intent(DifferentiationIntent::MakeEasier).unwrap();

    let err = ctrl.submit(&gen, TIMEOUT).await.unwrap_err();
    assert_eq!(err, AppError::Validation(MISSING_SOURCE_OR_INTENT.into()));
    assert_eq!(gen.calls(), 0);
    assert_eq!(existing(&ctrl).outcome, RequestOutcome::Idle);
    assert_eq!(existing(&ctrl).notice.as_deref(), Some(MISSING_SOURCE_OR_INTENT));
  }

  #[tokio::test]
  async fn missing_intent_is_a_validation_error() {
    let gen = Scripted::ok("x");
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("3 + 4 = ?".into()).unwrap();

    assert!(ctrl.submit(&gen, TIMEOUT).await.is_err());
    assert_eq!(gen.calls(), 0);
  }

  #[tokio::test]
  async fn custom_intent_requires_custom_text() {
    let gen = Scripted::ok("x");
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("3 + 4 = ?".into()).unwrap();
    ctrl.select_intent(DifferentiationIntent::Custom).unwrap();

    let err = ctrl.submit(&gen, TIMEOUT).await.unwrap_err();
    assert_eq!(err, AppError::Validation(MISSING_CUSTOM_TEXT.into()));
    assert_eq!(gen.calls(), 0);

    ctrl.set_custom_text("Maak de getallen groter".into()).unwrap();
    assert!(ctrl.submit(&gen, TIMEOUT).await.unwrap());
    assert_eq!(gen.calls(), 1);
    assert!(gen.prompts.lock().unwrap()[0].contains("Maak de getallen groter"));
    assert!(existing(&ctrl).notice.is_none());
  }

  #[tokio::test]
  async fn existing_flow_stores_raw_reply() {
    let gen = Scripted::ok("## 🟢 Makkelijk\nTel 2 + 2");
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("Reken 12 + 19 uit.".into()).unwrap();
    ctrl.select_intent(DifferentiationIntent::MakeEasier).unwrap();

    assert!(ctrl.submit(&gen, TIMEOUT).await.unwrap());
    assert_eq!(
      existing(&ctrl).outcome,
      RequestOutcome::Success("## 🟢 Makkelijk\nTel 2 + 2".into())
    );
    assert!(gen.prompts.lock().unwrap()[0].contains("Reken 12 + 19 uit."));
  }

  #[tokio::test]
  async fn split_submit_matches_whole_submit() {
    let gen = Scripted::ok("Makkelijkere versie");
    let prepare = || {
      let mut ctrl = InteractionController::new();
      ctrl.select_mode(Mode::Existing).unwrap();
      ctrl.set_source_text("Reken 12 + 19 uit.".into()).unwrap();
      ctrl.select_intent(DifferentiationIntent::MakeEasier).unwrap();
      ctrl
    };

    let mut whole = prepare();
    assert!(whole.submit(&gen, TIMEOUT).await.unwrap());

    let mut split = prepare();
    let pending = split.begin_submit().unwrap().expect("request");
    let result = pending.run(&gen, TIMEOUT).await;
    assert!(split.finish_submit(pending.ticket, result));

    assert_eq!(existing(&whole).outcome, existing(&split).outcome);
    let prompts = gen.prompts.lock().unwrap();
    assert_eq!(prompts[0], prompts[1]);
    assert_eq!(gen.calls(), 2);
  }

  #[tokio::test]
  async fn new_flow_extracts_sections() {
    let gen = Scripted::ok("## 🟢 Makkelijk\nA\n## 🟡 Normaal\nB\n## 🔴 Moeilijk\nC\n## 📋 Antwoordmodel\nD");
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::New).unwrap();
    ctrl.update_spec(filled_spec()).unwrap();

    assert!(ctrl.submit(&gen, TIMEOUT).await.unwrap());
    let expected = GeneratedSections {
      easy: "Makkelijk\nA".into(),
      normal: "Normaal\nB".into(),
      hard: "Moeilijk\nC".into(),
      answer_key: "Antwoordmodel\nD".into(),
    };
    assert_eq!(new_screen(&ctrl).outcome, RequestOutcome::Success(expected));
    assert!(gen.prompts.lock().unwrap()[0].contains("**Onderwerp:** Werkwoordspelling"));
  }

  #[tokio::test]
  async fn new_flow_with_unstructured_reply_uses_fallback() {
    let gen = Scripted::ok("Hier is je oefening zonder kopjes.");
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::New).unwrap();
    ctrl.update_spec(filled_spec()).unwrap();
    ctrl.submit(&gen, TIMEOUT).await.unwrap();

    match &new_screen(&ctrl).outcome {
      RequestOutcome::Success(s) => {
        assert_eq!(s.easy, "Hier is je oefening zonder kopjes.");
        assert_eq!(s.answer_key, FALLBACK_PLACEHOLDER);
      }
      other => panic!("unexpected outcome {other:?}"),
    }
  }

  #[tokio::test]
  async fn incomplete_spec_is_rejected_locally() {
    let gen = Scripted::ok("x");
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::New).unwrap();
    ctrl.update_spec(SpecPatch { subject: Some("Wiskunde".into()), ..Default::default() }).unwrap();

    assert!(ctrl.submit(&gen, TIMEOUT).await.is_err());
    assert_eq!(gen.calls(), 0);
    assert_eq!(new_screen(&ctrl).notice.as_deref(), Some("Vul alle verplichte velden in"));
  }

  #[tokio::test]
  async fn failure_is_recorded_and_resubmit_goes_to_loading() {
    let gen = Scripted::failing();
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("tekst".into()).unwrap();
    ctrl.select_intent(DifferentiationIntent::RandomizeData).unwrap();

    assert!(ctrl.submit(&gen, TIMEOUT).await.unwrap());
    assert_eq!(
      existing(&ctrl).outcome,
      RequestOutcome::Failure(GENERATION_FAILED_MESSAGE.into())
    );

    let pending = ctrl.begin_submit().unwrap().expect("new request");
    assert_eq!(existing(&ctrl).outcome, RequestOutcome::Loading);
    assert!(ctrl.finish_submit(pending.ticket, Ok("gelukt".into())));
    assert_eq!(existing(&ctrl).outcome, RequestOutcome::Success("gelukt".into()));
  }

  #[test]
  fn second_submit_while_loading_is_ignored() {
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("tekst".into()).unwrap();
    ctrl.select_intent(DifferentiationIntent::MakeHarder).unwrap();

    let first = ctrl.begin_submit().unwrap().expect("first request");
    assert!(ctrl.begin_submit().unwrap().is_none());
    assert!(ctrl.finish_submit(first.ticket, Ok("klaar".into())));
  }

  #[test]
  fn reply_after_back_navigation_is_dropped() {
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("tekst".into()).unwrap();
    ctrl.select_intent(DifferentiationIntent::ChangeContext).unwrap();
    let pending = ctrl.begin_submit().unwrap().unwrap();

    ctrl.back();
    ctrl.select_mode(Mode::Existing).unwrap();
    assert!(!ctrl.finish_submit(pending.ticket, Ok("oud".into())));
    assert_eq!(existing(&ctrl).outcome, RequestOutcome::Idle);
    assert_eq!(existing(&ctrl).source_text, "");
  }

  #[test]
  fn reset_keeps_form_after_a_settled_result() {
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::New).unwrap();
    ctrl.update_spec(filled_spec()).unwrap();
    let pending = ctrl.begin_submit().unwrap().unwrap();
    assert!(ctrl.finish_submit(pending.ticket, Ok("## 🟢 Makkelijk\nE".into())));

    ctrl.reset();
    let screen = new_screen(&ctrl);
    assert_eq!(screen.outcome, RequestOutcome::Idle);
    assert_eq!(screen.spec.topic, "Werkwoordspelling");
  }

  #[test]
  fn reset_while_loading_cannot_start_a_second_request() {
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("tekst".into()).unwrap();
    ctrl.select_intent(DifferentiationIntent::MakeEasier).unwrap();
    let first = ctrl.begin_submit().unwrap().expect("first request");

    ctrl.reset();
    ctrl.dismiss_notice();
    assert!(ctrl.is_loading());
    assert!(ctrl.begin_submit().unwrap().is_none());

    assert!(ctrl.finish_submit(first.ticket, Ok("klaar".into())));
    assert_eq!(existing(&ctrl).outcome, RequestOutcome::Success("klaar".into()));
  }

  #[test]
  fn commands_on_the_wrong_screen_are_refused() {
    let mut ctrl = InteractionController::new();
    assert!(ctrl.set_source_text("x".into()).is_err());
    assert!(ctrl.begin_submit().is_err());

    ctrl.select_mode(Mode::New).unwrap();
    assert!(ctrl.select_intent(DifferentiationIntent::MakeEasier).is_err());
    assert_eq!(
      ctrl.select_mode(Mode::Existing).unwrap_err(),
      AppError::Validation(WRONG_SCREEN.into())
    );
  }

  #[test]
  fn upload_results_update_source_or_notice() {
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();

    ctrl.apply_upload(Err(AppError::UploadRejected("Alleen .docx, .pdf en .txt bestanden worden ondersteund".into()))).unwrap();
    assert!(existing(&ctrl).notice.is_some());
    assert_eq!(existing(&ctrl).source_text, "");

    ctrl.apply_upload(Ok("Opdracht uit bestand".into())).unwrap();
    assert_eq!(existing(&ctrl).source_text, "Opdracht uit bestand");
    assert!(existing(&ctrl).notice.is_none());
  }

  #[test]
  fn dismiss_clears_notice_and_failure() {
    let mut ctrl = InteractionController::new();
    ctrl.select_mode(Mode::Existing).unwrap();
    ctrl.set_source_text("tekst".into()).unwrap();
    ctrl.select_intent(DifferentiationIntent::MakeEasier).unwrap();
    let pending = ctrl.begin_submit().unwrap().unwrap();
    ctrl.finish_submit(pending.ticket, Err(AppError::generation("boom")));

    ctrl.dismiss_notice();
    assert_eq!(existing(&ctrl).outcome, RequestOutcome::Idle);
  }

  #[test]
  fn snapshot_serializes_screen_tag() {
    let mut ctrl = InteractionController::new();
    assert_eq!(serde_json::to_value(ctrl.screen()).unwrap()["screen"], "mode_select");
    ctrl.select_mode(Mode::Existing).unwrap();
    let v = serde_json::to_value(ctrl.screen()).unwrap();
    assert_eq!(v["screen"], "existing_exercise");
    assert_eq!(v["outcome"]["status"], "idle");
    assert_eq!(v["sourceText"], "");
  }
}
