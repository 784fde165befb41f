// Storage layer: the draft handoff slot and the saved-quiz library

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{QuizDraft, SavedQuiz};

pub struct Storage {
    data_dir: PathBuf,
    quizzes_dir: PathBuf,
}

impl Storage {
    pub fn new() -> Result<Self> {
        let data_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("quizforge");

        Self::at(data_dir)
    }

    pub fn at(data_dir: PathBuf) -> Result<Self> {
        let quizzes_dir = data_dir.join("quizzes");

        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;
        fs::create_dir_all(&quizzes_dir).context("Failed to create quizzes directory")?;

        Ok(Self {
            data_dir,
            quizzes_dir,
        })
    }

    #[must_use]
    pub fn handoff(&self) -> HandoffSlot {
        HandoffSlot {
            path: self.data_dir.join("pending_quiz.json"),
        }
    }

    fn quiz_path(&self, id: &Uuid) -> PathBuf {
        self.quizzes_dir.join(format!("{id}.json"))
    }

    /// Persist a finished draft to the local library.
    pub fn save_quiz(&self, draft: &QuizDraft) -> Result<SavedQuiz> {
        let saved = SavedQuiz::new(draft.clone());
        let content = serde_json::to_string_pretty(&saved).context("Failed to serialize quiz")?;
        fs::write(self.quiz_path(&saved.id), content).context("Failed to write quiz file")?;
        Ok(saved)
    }

    #[allow(dead_code)]
    pub fn load_quiz(&self, id: &Uuid) -> Result<SavedQuiz> {
        let path = self.quiz_path(id);
        if !path.exists() {
            anyhow::bail!("Quiz file not found");
        }
        let content = fs::read_to_string(&path).context("Failed to read quiz file")?;
        let saved: SavedQuiz = serde_json::from_str(&content).context("Failed to parse quiz file")?;
        Ok(saved)
    }

    /// All saved quizzes, most recent first. Unreadable files are skipped.
    #[allow(dead_code)]
    pub fn list_quizzes(&self) -> Result<Vec<SavedQuiz>> {
        let mut quizzes = Vec::new();

        if !self.quizzes_dir.exists() {
            return Ok(quizzes);
        }

        for entry in fs::read_dir(&self.quizzes_dir).context("Failed to read quizzes directory")? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                if let Ok(saved) = serde_json::from_str::<SavedQuiz>(&content) {
                    quizzes.push(saved);
                }
            }
        }

        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(quizzes)
    }

    #[allow(dead_code)]
    pub fn delete_quiz(&self, id: &Uuid) -> Result<()> {
        let path = self.quiz_path(id);
        if path.exists() {
            fs::remove_file(path).context("Failed to delete quiz file")?;
        }
        Ok(())
    }
}

/// Typed handoff channel between the pipeline and the preview screen.
///
/// One snapshot, written exactly once at the end of a successful run and
/// consumed exactly once: `take_once` deletes the snapshot as it reads it.
#[derive(Debug, Clone)]
pub struct HandoffSlot {
    path: PathBuf,
}

impl HandoffSlot {
    pub fn put(&self, draft: &QuizDraft) -> Result<()> {
        let content = serde_json::to_string_pretty(draft).context("Failed to serialize draft")?;
        fs::write(&self.path, content).context("Failed to write handoff snapshot")?;
        Ok(())
    }

    pub fn take_once(&self) -> Result<Option<QuizDraft>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).context("Failed to read handoff snapshot")?;
        let draft: QuizDraft =
            serde_json::from_str(&content).context("Failed to parse handoff snapshot")?;
        fs::remove_file(&self.path).context("Failed to clear handoff snapshot")?;
        Ok(Some(draft))
    }
}
