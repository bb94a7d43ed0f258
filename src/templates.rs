//! Instruction templates sent to the generation service.
//!
//! Two entry points:
//!   - `build_prompt` turns an existing exercise plus a differentiation intent
//!     into one instruction.
//!   - `build_creation_prompt` asks for a brand-new exercise in four sections.
//!
//! The creation template asks for level-2 headings starting with the markers
//! that `sections::extract_sections` recognizes. The service is not obliged to
//! follow them; the extractor degrades gracefully when it doesn't.

use crate::domain::{DifferentiationIntent, NewExerciseSpec};
use crate::errors::{AppError, AppResult};
use crate::util::{fill_template, is_blank};

pub const MISSING_SPEC_FIELDS: &str = "Vul alle verplichte velden in";
pub const MISSING_CUSTOM_TEXT: &str = "Beschrijf eerst wat je wilt aanpassen";

const EXISTING_HEADER: &str = "Hier is een bestaande oefening:

{exercise}

";

const MAKE_VARIANTS: &str = "Maak hiervan drie gedifferentieerde versies:

## 🟢 MAKKELIJKE VERSIE
[Maak een eenvoudigere versie met:
- Kleinere getallen of eenvoudigere concepten
- Meer begeleiding en stappenplannen
- Duidelijke voorbeelden
- Minder complexe vraagstelling]

## 🟡 NORMALE VERSIE (ORIGINEEL)
[Behoud de originele moeilijkheidsgraad maar verbeter waar nodig:
- Duidelijkere instructies
- Betere structuur
- Eventuele kleine aanpassingen voor helderheid]

## 🔴 MOEILIJKE VERSIE
[Maak een uitdagendere versie met:
- Grotere getallen of complexere concepten
- Minimale begeleiding
- Uitbreidingsvragen
- Meer analytisch denken vereist]

Zorg ervoor dat alle versies hetzelfde leerdoel hebben.";

const MAKE_EASIER: &str = "Maak hiervan een makkelijkere versie die geschikt is voor leerlingen die extra ondersteuning nodig hebben. Denk aan:
- Kleinere getallen
- Eenvoudigere woordenschat
- Meer stappenplannen
- Duidelijke voorbeelden
- Minder onderdelen tegelijk
- Meer begeleiding

Behoud wel hetzelfde leerdoel.";

const MAKE_HARDER: &str = "Maak hiervan een moeilijkere versie die geschikt is voor leerlingen die extra uitdaging nodig hebben. Denk aan:
- Grotere getallen
- Complexere situaties
- Minder begeleiding
- Uitbreidingsvragen
- Meer stappen tegelijk
- Analytischer denken

Behoud wel hetzelfde leerdoel.";

const RANDOMIZE_DATA: &str = "Maak een nieuwe versie met andere getallen, namen, plaatsen of gegevens, maar behoud exact dezelfde structuur en moeilijkheidsgraad. Verander alleen de concrete data, niet de opzet van de opdracht.";

const CHANGE_CONTEXT: &str = "Maak een nieuwe versie met hetzelfde leerdoel maar in een andere context of situatie. Bijvoorbeeld:
- Andere setting (school → winkel → sport)
- Andere personages
- Andere voorwerpen
- Andere tijdsperiode

Behoud de moeilijkheidsgraad en het leerdoel.";

const CUSTOM: &str = "Pas deze oefening aan volgens de volgende wens:

{custom}

Zorg ervoor dat de aanpassing logisch en educatief verantwoord is.";

const CREATE_NEW: &str = "Maak een gedifferentieerde oefening voor het onderwijs met de volgende specificaties:

**Vak:** {subject}
**Onderwerp:** {topic}
**Groep/Klas:** {grade_level}
**Type oefening:** {exercise_type}
{additional_info}
Maak drie versies van dezelfde oefening:

## 🟢 MAKKELIJKE VERSIE
[Maak een eenvoudige versie met:
- Kleinere getallen/eenvoudigere concepten
- Meer begeleiding en stappenplannen
- Duidelijke voorbeelden
- Minder complexe vraagstelling]

## 🟡 NORMALE VERSIE
[Maak een standaard versie met:
- Gemiddelde moeilijkheidsgraad
- Standaard getallen/concepten voor dit niveau
- Beperkte begeleiding
- Normale vraagstelling]

## 🔴 MOEILIJKE VERSIE
[Maak een uitdagende versie met:
- Grotere getallen/complexere concepten
- Minimale begeleiding
- Uitbreidingsvragen
- Meer analytisch denken vereist]

## 📋 ANTWOORDMODEL
[Geef voor alle drie de versies:
- Uitgewerkte antwoorden
- Stappenplannen waar relevant
- Beoordelingscriteria
- Tips voor feedback]

Zorg ervoor dat alle versies hetzelfde leerdoel hebben maar op verschillende niveaus worden aangeboden. Gebruik duidelijke Nederlandse taal die past bij {grade_level}.";

fn intent_body(intent: DifferentiationIntent) -> &'static str {
  match intent {
    DifferentiationIntent::MakeVariants => MAKE_VARIANTS,
    DifferentiationIntent::MakeEasier => MAKE_EASIER,
    DifferentiationIntent::MakeHarder => MAKE_HARDER,
    DifferentiationIntent::RandomizeData => RANDOMIZE_DATA,
    DifferentiationIntent::ChangeContext => CHANGE_CONTEXT,
    DifferentiationIntent::Custom => CUSTOM,
  }
}

/// Build the instruction for transforming an existing exercise.
///
/// `source_text` is interpolated verbatim. `custom_text` is only read for
/// `Custom`, where it must carry visible text.
pub fn build_prompt(
  intent: DifferentiationIntent,
  source_text: &str,
  custom_text: &str,
) -> AppResult<String> {
  if intent.requires_custom_text() && is_blank(custom_text) {
    return Err(AppError::Validation(MISSING_CUSTOM_TEXT.into()));
  }

  let template = format!("{EXISTING_HEADER}{}", intent_body(intent));
  Ok(fill_template(
    &template,
    &[("exercise", source_text), ("custom", custom_text)],
  ))
}

/// Build the instruction for a new exercise in four labeled sections.
pub fn build_creation_prompt(spec: &NewExerciseSpec) -> AppResult<String> {
  if !spec.is_complete() {
    return Err(AppError::Validation(MISSING_SPEC_FIELDS.into()));
  }

  let additional = if is_blank(&spec.additional_info) {
    String::new()
  } else {
    format!("**Extra informatie:** {}\n", spec.additional_info)
  };

  Ok(fill_template(
    CREATE_NEW,
    &[
      ("subject", &spec.subject),
      ("topic", &spec.topic),
      ("grade_level", &spec.grade_level),
      ("exercise_type", &spec.exercise_type),
      ("additional_info", &additional),
    ],
  ))
}
