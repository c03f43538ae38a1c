//! Anki package export.
//!
//! Cards are image-only notes: the front field shows the question crop, the
//! back field appends the answer crop under a divider. Media file names are
//! derived from a digest of the front image's PNG bytes, and because the
//! note guid is computed from the field contents, re-exporting the same
//! scans produces the same guids — Anki treats the import as an update of
//! the existing deck rather than a pile of duplicates.

use crate::config::ExtractionConfig;
use crate::error::CardSliceError;
use crate::output::Flashcard;
use genanki_rs::{Deck, Field, Model, Note, Package, Template};
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Model id shared by every deck this tool writes. Anki matches notes by
/// (model, guid), so the id must never change between releases.
const MODEL_ID: i64 = 2125390554;

fn card_model() -> Model {
    Model::new(
        MODEL_ID,
        "cardslice model",
        vec![Field::new("QuestionMedia"), Field::new("AnswerMedia")],
        vec![Template::new("Card 1")
            .qfmt("{{QuestionMedia}}")
            .afmt(r#"{{QuestionMedia}}<hr id="answer">{{AnswerMedia}}"#)],
    )
}

/// Write the extracted cards as a self-contained `.apkg` file.
///
/// Media images are staged in a temporary directory that lives until the
/// package (which embeds them) has been written. The write is atomic:
/// the package goes to a sibling temp name first and is renamed into place.
pub fn write_package(
    flashcards: &[Flashcard],
    config: &ExtractionConfig,
    output: &Path,
) -> Result<(), CardSliceError> {
    let to_write_err = |detail: String| CardSliceError::PackageWriteFailed {
        path: output.to_path_buf(),
        detail,
    };

    let staging = tempfile::tempdir().map_err(|e| to_write_err(format!("staging dir: {e}")))?;
    let model = card_model();
    let deck_id = config
        .deck_id
        .unwrap_or_else(|| stable_deck_id(&config.deck_name));
    let mut deck = Deck::new(
        deck_id,
        &config.deck_name,
        "Flashcards sliced from scanned notebook pages",
    );

    let mut media_files: Vec<String> = Vec::with_capacity(flashcards.len() * 2);
    for card in flashcards {
        let front_png = encode_png(&card.front).map_err(to_write_err)?;
        let back_png = encode_png(&card.back).map_err(to_write_err)?;

        // Digest of the front side names both files; identical re-scans
        // collapse onto the same media and the same note guid.
        let digest = hex::encode(Sha256::digest(&front_png));
        let front_name = format!("{}-front.png", &digest[..16]);
        let back_name = format!("{}-back.png", &digest[..16]);

        for (name, bytes) in [(&front_name, &front_png), (&back_name, &back_png)] {
            let staged = staging.path().join(name);
            std::fs::write(&staged, bytes).map_err(|e| to_write_err(format!("media {name}: {e}")))?;
            media_files.push(staged.to_string_lossy().into_owned());
        }

        let front_field = format!(r#"<img src="{front_name}">"#);
        let back_field = format!(r#"<img src="{back_name}">"#);
        let note = Note::new(model.clone(), vec![front_field.as_str(), back_field.as_str()])
            .map_err(|e| to_write_err(format!("note: {e}")))?;
        deck.add_note(note);
        debug!("staged card {}", &digest[..16]);
    }

    let mut package = Package::new(
        vec![deck],
        media_files.iter().map(String::as_str).collect(),
    )
    .map_err(|e| to_write_err(format!("package: {e}")))?;

    let tmp_path = output.with_extension("apkg.tmp");
    package
        .write_to_file(&tmp_path.to_string_lossy())
        .map_err(|e| to_write_err(format!("write: {e}")))?;
    std::fs::rename(&tmp_path, output).map_err(|e| to_write_err(format!("rename: {e}")))?;

    info!(
        "wrote {} card(s) to {} (deck id {deck_id})",
        flashcards.len(),
        output.display()
    );
    Ok(())
}

/// Deterministic deck id from the deck name, so exporting under the same
/// name always targets the same Anki deck.
pub fn stable_deck_id(deck_name: &str) -> i64 {
    let digest = Sha256::digest(deck_name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    // Mask to the positive i64 range; Anki ids are positive integers.
    ((u64::from_be_bytes(bytes) & (i64::MAX as u64)) as i64).max(1)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| format!("PNG encode: {e}"))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid_card(r: u8) -> Flashcard {
        let front = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([r, 0, 0, 255])));
        let back = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, r, 0, 255])));
        Flashcard::new(front, back)
    }

    #[test]
    fn deck_id_is_stable_and_positive() {
        let a = stable_deck_id("Biology — Chapter 3");
        let b = stable_deck_id("Biology — Chapter 3");
        let c = stable_deck_id("Biology — Chapter 4");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a > 0);
    }

    #[test]
    fn package_write_produces_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deck.apkg");
        let config = ExtractionConfig::builder()
            .deck_name("test deck")
            .build()
            .unwrap();

        write_package(&[solid_card(200), solid_card(90)], &config, &out).unwrap();

        let meta = std::fs::metadata(&out).unwrap();
        assert!(meta.len() > 0, "package file must not be empty");
        // No temp file left behind.
        assert!(!out.with_extension("apkg.tmp").exists());
    }
}
