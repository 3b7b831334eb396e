//! Fakes shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::completion::{CompletionRequest, CompletionService, QueryKind};
use crate::error::{Error, Result};
use crate::language::rules::FRENCH;
use crate::store::executor::Cursor;
use crate::store::homophones::{
    is_link_eligible, split_association, ITEM_SEPARATOR, SECTION_SEPARATOR,
};
use crate::store::statement::{SqlValue, Statement, StatementKind};

// ─── Completion ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Scripted {
    Content(String),
    Failure { status: u16, message: String },
}

/// Completion service answering from a script keyed by query kind and subject.
///
/// Unscripted requests get an empty reply. The last reply for a key is
/// repeated once its queue is down to one item.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<HashMap<(QueryKind, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<(QueryKind, String)>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, kind: QueryKind, subject: &str, scripted: Scripted) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies
                .entry((kind, subject.to_string()))
                .or_default()
                .push_back(scripted);
        }
        self
    }

    pub fn reply(self, kind: QueryKind, subject: &str, body: Value) -> Self {
        self.push(kind, subject, Scripted::Content(body.to_string()))
    }

    pub fn reply_raw(self, kind: QueryKind, subject: &str, content: &str) -> Self {
        self.push(kind, subject, Scripted::Content(content.to_string()))
    }

    pub fn fail(self, kind: QueryKind, subject: &str, status: u16, message: &str) -> Self {
        self.push(
            kind,
            subject,
            Scripted::Failure { status, message: message.to_string() },
        )
    }

    pub fn calls(&self) -> Vec<(QueryKind, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_of(&self, kind: QueryKind) -> usize {
        self.calls().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl CompletionService for ScriptedCompletion {
    fn model(&self) -> &str {
        "scripted"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let key = (request.kind, request.subject.clone());
        self.calls.lock().unwrap().push(key.clone());
        let mut replies = self.replies.lock().unwrap();
        let next = match replies.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match next {
            Some(Scripted::Content(content)) => Ok(content),
            Some(Scripted::Failure { status, message }) => Err(Error::Service { status, message }),
            None => Ok(String::new()),
        }
    }
}

/// Present-tense paradigm of `être` as a model would return it.
pub fn etre_present_forms() -> Value {
    json!([
        {"pronoun": "je", "phrase": "je suis", "translation": "soy"},
        {"pronoun": "tu", "phrase": "tu es", "translation": "eres"},
        {"pronoun": "il", "phrase": "il est", "translation": "él es"},
        {"pronoun": "elle", "phrase": "elle est", "translation": "ella es"},
        {"pronoun": "on", "phrase": "on est", "translation": "se es"},
        {"pronoun": "nous", "phrase": "nous sommes", "translation": "somos"},
        {"pronoun": "vous", "phrase": "vous êtes", "translation": "sois"},
        {"pronoun": "ils", "phrase": "ils sont", "translation": "ellos son"},
        {"pronoun": "elles", "phrase": "elles sont", "translation": "ellas son"}
    ])
}

// ─── Storage ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Row {
    id: i64,
    list_id: i64,
    word: String,
    association: Option<String>,
    transcription: Option<String>,
}

impl Row {
    fn has_association(&self) -> bool {
        self.association.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false)
    }

    fn lists(&self, word: &str) -> bool {
        self.association
            .as_deref()
            .map(|a| split_association(a).1.contains(&word))
            .unwrap_or(false)
    }

    fn append(&mut self, items: &str) {
        let current = self.association.clone().unwrap_or_default();
        let join = if current.contains(SECTION_SEPARATOR) {
            ITEM_SEPARATOR
        } else {
            SECTION_SEPARATOR
        };
        self.association = Some(format!("{}{}{}", current, join, items));
    }
}

/// In-memory `words` table that interprets compiled statements by kind.
///
/// Peer eligibility uses the French rules, matching the SQL filters the
/// French statements carry.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    rows: Vec<Row>,
    rejected: HashSet<(String, String, String)>,
    fail_on: Option<StatementKind>,
    next_id: i64,
}

fn text(params: &[SqlValue], index: usize) -> Result<Option<String>> {
    match params.get(index) {
        Some(SqlValue::Text(s)) => Ok(Some(s.clone())),
        Some(SqlValue::Null) => Ok(None),
        other => Err(Error::Persistence(format!("param {} is not text: {:?}", index, other))),
    }
}

fn required_text(params: &[SqlValue], index: usize) -> Result<String> {
    text(params, index)?.ok_or_else(|| Error::Persistence(format!("param {} is null", index)))
}

fn int(params: &[SqlValue], index: usize) -> Result<i64> {
    params
        .get(index)
        .and_then(SqlValue::as_int)
        .ok_or_else(|| Error::Persistence(format!("param {} is not an integer", index)))
}

fn legacy_multi_comma(association: &str) -> bool {
    association.matches(',').count() >= 2
}

impl MemoryCursor {
    pub fn seed(
        &mut self,
        list_id: i64,
        word: &str,
        association: Option<&str>,
        transcription: Option<&str>,
    ) {
        self.next_id += 1;
        self.rows.push(Row {
            id: self.next_id,
            list_id,
            word: word.to_string(),
            association: association.map(str::to_string),
            transcription: transcription.map(str::to_string),
        });
    }

    pub fn reject(&mut self, user_id: &str, language: &str, word: &str) {
        self.rejected
            .insert((user_id.to_string(), language.to_string(), word.to_string()));
    }

    /// Make every statement of `kind` fail.
    pub fn fail_on(&mut self, kind: StatementKind) {
        self.fail_on = Some(kind);
    }

    fn row(&self, list_id: i64, word: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.list_id == list_id && r.word == word)
    }

    fn row_mut(&mut self, list_id: i64, word: &str) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.list_id == list_id && r.word == word)
    }

    pub fn association(&self, list_id: i64, word: &str) -> Option<String> {
        self.row(list_id, word).and_then(|r| r.association.clone())
    }

    pub fn transcription(&self, list_id: i64, word: &str) -> Option<String> {
        self.row(list_id, word).and_then(|r| r.transcription.clone())
    }

    pub fn id_of(&self, list_id: i64, word: &str) -> Option<i64> {
        self.row(list_id, word).map(|r| r.id)
    }

    pub fn count(&self, list_id: i64, word: &str) -> usize {
        self.rows
            .iter()
            .filter(|r| r.list_id == list_id && r.word == word)
            .count()
    }

    /// A guarded statement carries `(user, language, word)` after its own params.
    fn blocked(&self, params: &[SqlValue], own: usize) -> Result<bool> {
        if params.len() == own {
            return Ok(false);
        }
        let key = (
            required_text(params, own)?,
            required_text(params, own + 1)?,
            required_text(params, own + 2)?,
        );
        Ok(self.rejected.contains(&key))
    }

    fn insert(&mut self, p: &[SqlValue]) -> Result<u64> {
        if self.blocked(p, 4)? {
            return Ok(0);
        }
        let word = required_text(p, 0)?;
        let list_id = int(p, 2)?;
        if self.row(list_id, &word).is_some() {
            return Ok(0);
        }
        let association = text(p, 1)?;
        let transcription = text(p, 3)?;
        self.seed(list_id, &word, association.as_deref(), transcription.as_deref());
        Ok(1)
    }

    fn update(&mut self, kind: StatementKind, p: &[SqlValue]) -> Result<u64> {
        if self.blocked(p, 3)? {
            return Ok(0);
        }
        let value = text(p, 0)?;
        let word = required_text(p, 1)?;
        let list_id = int(p, 2)?;
        let Some(row) = self.row_mut(list_id, &word) else {
            return Ok(0);
        };
        let applies = match kind {
            StatementKind::UpdateTranscription => row.transcription.is_none(),
            StatementKind::UpdateAssociation => !row.has_association(),
            StatementKind::RepairAssociation => {
                !row.has_association()
                    || row
                        .association
                        .as_deref()
                        .map(legacy_multi_comma)
                        .unwrap_or(false)
            }
            _ => true,
        };
        if !applies {
            return Ok(0);
        }
        if kind == StatementKind::UpdateTranscription {
            row.transcription = value;
        } else {
            row.association = value;
        }
        Ok(1)
    }

    fn peers_of(&self, list_id: i64, word: &str, transcription: &str) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.list_id == list_id
                    && r.word != word
                    && r.transcription.as_deref() == Some(transcription)
                    && r.has_association()
                    && is_link_eligible(&FRENCH, &r.word)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn link_self(&mut self, p: &[SqlValue]) -> Result<u64> {
        let list_id = int(p, 0)?;
        let word = required_text(p, 1)?;
        let transcription = required_text(p, 2)?;
        let Some(own) = self.rows.iter().position(|r| {
            r.list_id == list_id
                && r.word == word
                && r.transcription.as_deref() == Some(transcription.as_str())
        }) else {
            return Ok(0);
        };
        if !self.rows[own].has_association() {
            return Ok(0);
        }
        let mut missing: Vec<String> = self
            .peers_of(list_id, &word, &transcription)
            .into_iter()
            .map(|i| self.rows[i].word.clone())
            .filter(|w| !self.rows[own].lists(w))
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }
        missing.sort();
        self.rows[own].append(&missing.join(ITEM_SEPARATOR));
        Ok(1)
    }

    fn link_peers(&mut self, p: &[SqlValue]) -> Result<u64> {
        let word = required_text(p, 0)?;
        let list_id = int(p, 1)?;
        let transcription = required_text(p, 2)?;
        let current_ok = self
            .row(list_id, &word)
            .map(|r| {
                r.transcription.as_deref() == Some(transcription.as_str()) && r.has_association()
            })
            .unwrap_or(false);
        if !current_ok {
            return Ok(0);
        }
        let mut updated = 0;
        for i in self.peers_of(list_id, &word, &transcription) {
            if !self.rows[i].lists(&word) {
                self.rows[i].append(&word);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

impl Cursor for MemoryCursor {
    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        statement.validate()?;
        if self.fail_on == Some(statement.kind) {
            return Err(Error::Persistence(format!("{:?} failed", statement.kind)));
        }
        let p = &statement.params;
        match statement.kind {
            StatementKind::InsertEntry => self.insert(p),
            StatementKind::UpdateTranscription
            | StatementKind::UpdateAssociation
            | StatementKind::RepairAssociation
            | StatementKind::SetAssociation => self.update(statement.kind, p),
            StatementKind::LinkHomophonesSelf => self.link_self(p),
            StatementKind::LinkHomophonesPeers => self.link_peers(p),
            other => Err(Error::Persistence(format!("{:?} is a query", other))),
        }
    }

    fn query(&mut self, statement: &Statement) -> Result<Vec<Vec<SqlValue>>> {
        statement.validate()?;
        let p = &statement.params;
        match statement.kind {
            StatementKind::SelectEntry => {
                let list_id = int(p, 0)?;
                let word = required_text(p, 1)?;
                Ok(self
                    .row(list_id, &word)
                    .map(|r| vec![r.association.clone().into(), r.transcription.clone().into()])
                    .into_iter()
                    .collect())
            }
            StatementKind::SelectHomophoneCandidates => {
                let list_id = int(p, 0)?;
                let transcription = required_text(p, 1)?;
                let word = required_text(p, 2)?;
                Ok(self
                    .rows
                    .iter()
                    .filter(|r| {
                        r.list_id == list_id
                            && r.word != word
                            && !r.word.contains(' ')
                            && r.transcription.as_deref() == Some(transcription.as_str())
                    })
                    .map(|r| vec![r.word.clone().into(), r.association.clone().into()])
                    .collect())
            }
            StatementKind::SelectEntryId => {
                let word = required_text(p, 0)?;
                let list_id = int(p, 1)?;
                Ok(self
                    .row(list_id, &word)
                    .map(|r| vec![SqlValue::Int(r.id)])
                    .into_iter()
                    .collect())
            }
            other => Err(Error::Persistence(format!("{:?} is not a query", other))),
        }
    }
}
