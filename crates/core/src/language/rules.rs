//! Per-language grammar tables.
//!
//! A [`LanguageRules`] value is selected once per invocation with
//! [`rules_for`] and handed to every resolver. French carries most of the
//! elaboration (elision, contractions, conjugation heuristics); German gets
//! its article set and pronoun groups; any other tag falls back to a
//! permissive table that accepts model output as-is.

use crate::types::Gender;

/// Grammar tables and helpers for one source language.
#[derive(Debug)]
pub struct LanguageRules {
    pub code: &'static str,
    pub name: &'static str,
    /// Lowercase user input during normalization.
    pub lowercase: bool,
    /// Closed article set. `None` accepts any non-empty article.
    articles: Option<&'static [&'static str]>,
    elided_article: Option<&'static str>,
    elidable_articles: &'static [&'static str],
    elision_initials: &'static str,
    contraction_prefixes: &'static [&'static str],
    gendered_articles: &'static [(&'static str, Gender)],
    common_adverbs: &'static [&'static str],
    ambiguous_noun_verbs: &'static [(&'static str, &'static str)],
    verb_form_suffixes: &'static [&'static str],
    verb_form_exceptions: &'static [&'static str],
    non_verb_suffixes: &'static [&'static str],
    invariable_nouns: &'static [&'static str],
    singularizes_plurals: bool,
    feminine_suffix: Option<&'static str>,
    pronoun_groups: &'static [(&'static str, &'static str)],
    pronoun_aliases: &'static [(&'static str, &'static str)],
    elided_pronouns: &'static [(&'static str, &'static str)],
    adverbial_translation_suffix: Option<&'static str>,
    marks_elided_gender: bool,
    liaison_segment_check: bool,
    /// Ask once more for the article when the first noun reply has none.
    article_retry: bool,
}

const FRENCH_ELISION_INITIALS: &str = "aeiouyàâäéèêëîïôöùûüœæh";

pub static FRENCH: LanguageRules = LanguageRules {
    code: "fr",
    name: "French",
    lowercase: true,
    articles: Some(&["le", "la", "les", "l'"]),
    elided_article: Some("l'"),
    elidable_articles: &["le", "la"],
    elision_initials: FRENCH_ELISION_INITIALS,
    contraction_prefixes: &["d'", "l'"],
    gendered_articles: &[("le", Gender::Masculine), ("la", Gender::Feminine)],
    common_adverbs: &[
        "tard", "tôt", "ici", "là", "hier", "demain", "aujourd'hui", "toujours", "jamais",
        "souvent", "parfois", "déjà", "encore", "très", "trop", "assez", "bien", "mal", "vite",
    ],
    ambiguous_noun_verbs: &[("été", "être")],
    verb_form_suffixes: &["e", "es", "ent", "ons", "ez"],
    verb_form_exceptions: &[
        "suis", "es", "est", "sommes", "êtes", "sont", "ai", "as", "a", "avons", "avez", "ont",
    ],
    non_verb_suffixes: &["ment"],
    invariable_nouns: &[
        "temps", "fois", "bras", "pays", "corps", "repas", "souris", "avis", "cas", "dos",
        "fils", "mois", "bois", "héros", "processus", "virus",
    ],
    singularizes_plurals: true,
    feminine_suffix: Some("e"),
    pronoun_groups: &[
        ("il", "il/elle/on"),
        ("elle", "il/elle/on"),
        ("on", "il/elle/on"),
        ("ils", "ils/elles"),
        ("elles", "ils/elles"),
    ],
    pronoun_aliases: &[("j", "je"), ("j'", "je")],
    elided_pronouns: &[("je", "j'")],
    adverbial_translation_suffix: Some("mente"),
    marks_elided_gender: true,
    liaison_segment_check: true,
    article_retry: true,
};

pub static GERMAN: LanguageRules = LanguageRules {
    code: "de",
    name: "German",
    lowercase: true,
    articles: Some(&["der", "die", "das", "ein", "eine"]),
    elided_article: None,
    elidable_articles: &[],
    elision_initials: "",
    contraction_prefixes: &[],
    gendered_articles: &[
        ("der", Gender::Masculine),
        ("die", Gender::Feminine),
        ("das", Gender::Neuter),
    ],
    common_adverbs: &[],
    ambiguous_noun_verbs: &[],
    verb_form_suffixes: &[],
    verb_form_exceptions: &[],
    non_verb_suffixes: &[],
    invariable_nouns: &[],
    singularizes_plurals: false,
    feminine_suffix: None,
    pronoun_groups: &[("er", "er/sie/man"), ("sie", "er/sie/man"), ("man", "er/sie/man")],
    pronoun_aliases: &[],
    elided_pronouns: &[],
    adverbial_translation_suffix: None,
    marks_elided_gender: false,
    liaison_segment_check: false,
    article_retry: false,
};

pub static GENERIC: LanguageRules = LanguageRules {
    code: "",
    name: "",
    lowercase: false,
    articles: None,
    elided_article: None,
    elidable_articles: &[],
    elision_initials: "",
    contraction_prefixes: &[],
    gendered_articles: &[],
    common_adverbs: &[],
    ambiguous_noun_verbs: &[],
    verb_form_suffixes: &[],
    verb_form_exceptions: &[],
    non_verb_suffixes: &[],
    invariable_nouns: &[],
    singularizes_plurals: false,
    feminine_suffix: None,
    pronoun_groups: &[],
    pronoun_aliases: &[],
    elided_pronouns: &[],
    adverbial_translation_suffix: None,
    marks_elided_gender: false,
    liaison_segment_check: false,
    article_retry: false,
};

/// Pick the rule table for a language tag (`fr`, `FR-fr`, `de`...).
pub fn rules_for(language: &str) -> &'static LanguageRules {
    let tag = language.trim().to_lowercase();
    let primary = tag.split(['-', '_']).next().unwrap_or("");
    match primary {
        "fr" => &FRENCH,
        "de" => &GERMAN,
        _ => &GENERIC,
    }
}

/// Unify the typographic apostrophes a model or keyboard may produce.
pub fn unify_apostrophes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2019}' | '\u{02BC}' | '\u{2032}' | '\u{2018}' => '\'',
            other => other,
        })
        .collect()
}

/// Parse a free-form gender label (`m`, `masculin`, `feminine`, `femenino`...).
pub fn parse_gender_label(raw: &str) -> Option<Gender> {
    match raw.trim().to_lowercase().as_str() {
        "m" | "masc" | "masculin" | "masculine" | "masculino" => Some(Gender::Masculine),
        "f" | "fem" | "féminin" | "feminin" | "feminine" | "femenin" | "femenino" => {
            Some(Gender::Feminine)
        }
        "n" | "neut" | "neuter" | "neutrum" | "neutro" => Some(Gender::Neuter),
        _ => None,
    }
}

impl LanguageRules {
    /// Human-readable name used in prompts.
    pub fn display_name(&self, tag: &str) -> String {
        if self.name.is_empty() {
            tag.trim().to_uppercase()
        } else {
            self.name.to_string()
        }
    }

    pub fn has_closed_articles(&self) -> bool {
        self.articles.is_some()
    }

    pub fn retries_missing_article(&self) -> bool {
        self.article_retry && self.has_closed_articles()
    }

    /// Allowed articles, for prompts.
    pub fn article_set(&self) -> &'static [&'static str] {
        self.articles.unwrap_or(&[])
    }

    /// Canonical article or `None` when the value is outside the closed set.
    pub fn normalize_article(&self, raw: &str) -> Option<String> {
        let cleaned = unify_apostrophes(raw.trim()).to_lowercase();
        if cleaned.is_empty() {
            return None;
        }
        match self.articles {
            Some(set) => set.iter().find(|a| **a == cleaned).map(|a| a.to_string()),
            None => Some(raw.trim().to_string()),
        }
    }

    pub fn gender_for_article(&self, article: &str) -> Option<Gender> {
        self.gendered_articles
            .iter()
            .find(|(a, _)| *a == article)
            .map(|(_, g)| *g)
    }

    /// Does the word start with a vowel or mute-h sound?
    pub fn starts_with_elision_sound(&self, word: &str) -> bool {
        if self.elision_initials.is_empty() {
            return false;
        }
        word.trim()
            .chars()
            .next()
            .map(|c| c.to_lowercase().any(|l| self.elision_initials.contains(l)))
            .unwrap_or(false)
    }

    /// Replace `le`/`la` with the elided article before a vowel sound.
    pub fn elide_article(&self, article: &str, word: &str) -> String {
        match self.elided_article {
            Some(elided)
                if self.elidable_articles.contains(&article)
                    && self.starts_with_elision_sound(word) =>
            {
                elided.to_string()
            }
            _ => article.to_string(),
        }
    }

    pub fn is_elided_article(&self, article: &str) -> bool {
        self.elided_article == Some(article)
    }

    pub fn is_elidable_article(&self, article: &str) -> bool {
        self.elidable_articles.contains(&article)
    }

    /// Join article and word; no space after an apostrophe.
    pub fn build_phrase(&self, article: Option<&str>, word: &str) -> String {
        match article.map(str::trim).filter(|a| !a.is_empty()) {
            Some(a) if a.ends_with('\'') => format!("{}{}", a, word),
            Some(a) => format!("{} {}", a, word),
            None => word.to_string(),
        }
    }

    /// Stored form of a noun phrase: elided phrases get a gender marker.
    pub fn mark_gender(
        &self,
        phrase: &str,
        article: Option<&str>,
        gender: Option<Gender>,
    ) -> String {
        let elided = article.map(|a| self.is_elided_article(a)).unwrap_or(false);
        match gender {
            Some(g @ (Gender::Masculine | Gender::Feminine))
                if self.marks_elided_gender && elided && !phrase.ends_with(')') =>
            {
                format!("{} ({})", phrase, g.marker())
            }
            _ => phrase.to_string(),
        }
    }

    /// Drop a non-lexical contraction prefix (`d'erreurs` → `erreurs`).
    pub fn strip_contraction<'a>(&self, token: &'a str) -> &'a str {
        for prefix in self.contraction_prefixes {
            if token.len() > prefix.len() {
                if let Some(head) = token.get(..prefix.len()) {
                    if head.eq_ignore_ascii_case(prefix) {
                        return &token[prefix.len()..];
                    }
                }
            }
        }
        token
    }

    pub fn contraction_prefixes(&self) -> &'static [&'static str] {
        self.contraction_prefixes
    }

    pub fn is_common_adverb(&self, word: &str) -> bool {
        self.common_adverbs.contains(&word)
    }

    /// Default lemma of a token known to be both a noun and a verb form.
    pub fn ambiguous_lemma(&self, word: &str) -> Option<&'static str> {
        self.ambiguous_noun_verbs
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, lemma)| *lemma)
    }

    /// Cheap morphological check for tokens a model tends to call nouns
    /// although they are conjugated verb forms.
    pub fn looks_like_conjugated_verb(&self, word: &str) -> bool {
        if self.verb_form_suffixes.is_empty() {
            return false;
        }
        let w = word.trim().to_lowercase();
        if self.ambiguous_lemma(&w).is_some() || self.verb_form_exceptions.contains(&w.as_str()) {
            return true;
        }
        if w.chars().count() < 4 {
            return false;
        }
        if self.non_verb_suffixes.iter().any(|s| w.ends_with(s)) {
            return false;
        }
        self.verb_form_suffixes.iter().any(|s| w.ends_with(s))
    }

    /// Singular for a regular plural, `None` when nothing safe applies.
    ///
    /// Only `-eaux` and plain `-s` are handled; `-aux` and other irregular
    /// patterns are left alone rather than guessed.
    pub fn singular_candidate(&self, word: &str) -> Option<String> {
        if !self.singularizes_plurals || self.invariable_nouns.contains(&word) {
            return None;
        }
        let len = word.chars().count();
        if word.ends_with("eaux") && len > 4 {
            return word.strip_suffix('x').map(str::to_string);
        }
        if word.ends_with('s') && len > 3 {
            return word.strip_suffix('s').map(str::to_string);
        }
        None
    }

    /// Feminine form predicted by the regular suffix rule.
    pub fn default_feminine(&self, word: &str) -> Option<String> {
        let suffix = self.feminine_suffix?;
        if word.ends_with(suffix) {
            Some(word.to_string())
        } else {
            Some(format!("{}{}", word, suffix))
        }
    }

    /// Merged slot label for pronouns that share verb forms.
    pub fn pronoun_group(&self, pronoun: &str) -> Option<&'static str> {
        let p = pronoun.trim().to_lowercase();
        self.pronoun_groups
            .iter()
            .find(|(member, _)| *member == p)
            .map(|(_, group)| *group)
    }

    pub fn canonical_pronoun(&self, pronoun: &str) -> String {
        let p = unify_apostrophes(pronoun.trim()).to_lowercase();
        self.pronoun_aliases
            .iter()
            .find(|(alias, _)| *alias == p)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(p)
    }

    /// Pronoun + conjugated form, eliding `je` before a vowel sound.
    pub fn verb_phrase(&self, pronoun: &str, form: &str) -> String {
        let pronoun = self.canonical_pronoun(pronoun);
        let form = form.trim();
        if pronoun.is_empty() {
            return form.to_string();
        }
        for (full, elided) in self.elided_pronouns {
            if pronoun == *full && self.starts_with_elision_sound(form) {
                return format!("{}{}", elided, form);
            }
        }
        format!("{} {}", pronoun, form)
    }

    /// `je aime` → `j'aime`; `None` when no pronoun elision applies.
    pub fn elide_pronoun_phrase(&self, phrase: &str) -> Option<String> {
        let (head, rest) = phrase.trim().split_once(' ')?;
        let head = self.canonical_pronoun(head);
        self.elided_pronouns
            .iter()
            .find(|(full, _)| *full == head)
            .filter(|_| self.starts_with_elision_sound(rest))
            .map(|(_, elided)| format!("{}{}", elided, rest.trim()))
    }

    /// Translation looks adverbial (Spanish `-mente`).
    pub fn has_adverbial_translation(&self, translation: &str) -> bool {
        match self.adverbial_translation_suffix {
            Some(suffix) => translation.trim().to_lowercase().ends_with(suffix),
            None => false,
        }
    }

    pub fn checks_liaison_segments(&self) -> bool {
        self.liaison_segment_check
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_for_selects_by_primary_tag() {
        assert_eq!(rules_for("fr").code, "fr");
        assert_eq!(rules_for(" FR-ca ").code, "fr");
        assert_eq!(rules_for("de").code, "de");
        assert_eq!(rules_for("it").code, "");
        assert_eq!(rules_for("it").display_name("it"), "IT");
    }

    #[test]
    fn test_normalize_article_closed_set() {
        assert_eq!(FRENCH.normalize_article("Le ").as_deref(), Some("le"));
        assert_eq!(FRENCH.normalize_article("l’").as_deref(), Some("l'"));
        assert_eq!(FRENCH.normalize_article("un"), None);
        assert_eq!(GERMAN.normalize_article("Die").as_deref(), Some("die"));
        assert_eq!(GERMAN.normalize_article("le"), None);
        assert_eq!(GENERIC.normalize_article("il").as_deref(), Some("il"));
        assert_eq!(GENERIC.normalize_article("  "), None);
    }

    #[test]
    fn test_elision_before_vowel_and_mute_h() {
        assert_eq!(FRENCH.elide_article("le", "ami"), "l'");
        assert_eq!(FRENCH.elide_article("la", "heure"), "l'");
        assert_eq!(FRENCH.elide_article("la", "Étoile"), "l'");
        assert_eq!(FRENCH.elide_article("le", "livre"), "le");
        assert_eq!(FRENCH.elide_article("les", "amis"), "les");
        assert_eq!(GERMAN.elide_article("der", "apfel"), "der");
    }

    #[test]
    fn test_build_phrase_and_gender_marker() {
        assert_eq!(FRENCH.build_phrase(Some("l'"), "ami"), "l'ami");
        assert_eq!(FRENCH.build_phrase(Some("le"), "livre"), "le livre");
        assert_eq!(FRENCH.build_phrase(None, "tard"), "tard");
        assert_eq!(
            FRENCH.mark_gender("l'ami", Some("l'"), Some(Gender::Masculine)),
            "l'ami (m)"
        );
        assert_eq!(
            FRENCH.mark_gender("le livre", Some("le"), Some(Gender::Masculine)),
            "le livre"
        );
        assert_eq!(FRENCH.mark_gender("l'eau", Some("l'"), None), "l'eau");
    }

    #[test]
    fn test_strip_contraction() {
        assert_eq!(FRENCH.strip_contraction("d'erreurs"), "erreurs");
        assert_eq!(FRENCH.strip_contraction("L'homme"), "homme");
        assert_eq!(FRENCH.strip_contraction("l'"), "l'");
        assert_eq!(FRENCH.strip_contraction("j'ai"), "j'ai");
        assert_eq!(GERMAN.strip_contraction("d'erreurs"), "d'erreurs");
    }

    #[test]
    fn test_conjugated_heuristic() {
        assert!(FRENCH.looks_like_conjugated_verb("été"));
        assert!(FRENCH.looks_like_conjugated_verb("sommes"));
        assert!(FRENCH.looks_like_conjugated_verb("parlez"));
        assert!(FRENCH.looks_like_conjugated_verb("livres"));
        assert!(FRENCH.looks_like_conjugated_verb("est"));
        assert!(!FRENCH.looks_like_conjugated_verb("rapidement"));
        assert!(!FRENCH.looks_like_conjugated_verb("ami"));
        assert!(!FRENCH.looks_like_conjugated_verb("amis"));
        assert!(!GERMAN.looks_like_conjugated_verb("gehe"));
    }

    #[test]
    fn test_singular_candidate() {
        assert_eq!(FRENCH.singular_candidate("livres").as_deref(), Some("livre"));
        assert_eq!(FRENCH.singular_candidate("châteaux").as_deref(), Some("château"));
        assert_eq!(FRENCH.singular_candidate("travaux"), None);
        assert_eq!(FRENCH.singular_candidate("temps"), None);
        assert_eq!(FRENCH.singular_candidate("bus"), None);
        assert_eq!(GERMAN.singular_candidate("autos"), None);
    }

    #[test]
    fn test_default_feminine() {
        assert_eq!(FRENCH.default_feminine("grand").as_deref(), Some("grande"));
        assert_eq!(FRENCH.default_feminine("rouge").as_deref(), Some("rouge"));
        assert_eq!(FRENCH.default_feminine("beau").as_deref(), Some("beaue"));
        assert_eq!(GERMAN.default_feminine("groß"), None);
    }

    #[test]
    fn test_verb_phrase_elides_je() {
        assert_eq!(FRENCH.verb_phrase("je", "aime"), "j'aime");
        assert_eq!(FRENCH.verb_phrase("j’", "habite"), "j'habite");
        assert_eq!(FRENCH.verb_phrase("je", "suis"), "je suis");
        assert_eq!(FRENCH.verb_phrase("", "être"), "être");
    }

    #[test]
    fn test_elide_pronoun_phrase() {
        assert_eq!(FRENCH.elide_pronoun_phrase("je aime").as_deref(), Some("j'aime"));
        assert_eq!(FRENCH.elide_pronoun_phrase("je suis"), None);
        assert_eq!(FRENCH.elide_pronoun_phrase("tu aimes"), None);
        assert_eq!(GERMAN.elide_pronoun_phrase("ich esse"), None);
    }

    #[test]
    fn test_pronoun_groups() {
        assert_eq!(FRENCH.pronoun_group("Elle"), Some("il/elle/on"));
        assert_eq!(FRENCH.pronoun_group("elles"), Some("ils/elles"));
        assert_eq!(FRENCH.pronoun_group("nous"), None);
        assert_eq!(GERMAN.pronoun_group("man"), Some("er/sie/man"));
    }

    #[test]
    fn test_gender_labels() {
        assert_eq!(parse_gender_label("Masculin"), Some(Gender::Masculine));
        assert_eq!(parse_gender_label("femenino"), Some(Gender::Feminine));
        assert_eq!(parse_gender_label("?"), None);
        assert_eq!(GERMAN.gender_for_article("das"), Some(Gender::Neuter));
    }

    #[test]
    fn test_adverbial_translation() {
        assert!(FRENCH.has_adverbial_translation("Rápidamente"));
        assert!(!FRENCH.has_adverbial_translation("mente abierta "));
        assert!(!GERMAN.has_adverbial_translation("rápidamente"));
    }
}
