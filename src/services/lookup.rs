//! Thin wrappers around the third-party lookup services: dictionary
//! definitions and phonetics, English-to-Chinese translation, and an
//! illustrative image. Only the dictionary call is load-bearing; the
//! translation falls back to the source text and the image is
//! best-effort.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::db::operations::words::{NewMeaning, NewWord};
use crate::services::pos::normalize_pos;

const DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
const TRANSLATE_URL: &str = "https://api.mymemory.translated.net/get";
const PIXABAY_URL: &str = "https://pixabay.com/api/";

/// Senses per part of speech carried into one meaning row.
const MAX_SENSES: usize = 3;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("词典未找到该单词")]
    NotFound,
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct LookupClient {
    http: reqwest::Client,
    pixabay_key: String,
}

impl LookupClient {
    pub fn from_env() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            pixabay_key: std::env::var("PIXABAY_API_KEY").unwrap_or_default(),
        }
    }

    /// Looks up a headword: definitions and phonetics from the
    /// dictionary, translated senses, and an illustrative image.
    pub async fn lookup(&self, word: &str) -> Result<NewWord, LookupError> {
        let word = word.trim().to_lowercase();
        let url = format!("{DICTIONARY_URL}/{}", urlencoding::encode(&word));

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::NotFound);
        }
        let data: Value = response.json().await?;
        let entry = data.get(0).ok_or(LookupError::NotFound)?;

        let (uk_phonetic, us_phonetic) = extract_phonetics(entry);
        let meanings = self.extract_meanings(entry).await;

        let image_url = match self.fetch_image(&word).await {
            Ok(url) => url,
            Err(err) => {
                // Auxiliary: image failures must not block the lookup.
                tracing::debug!(error = %err, word = %word, "image lookup failed");
                String::new()
            }
        };

        Ok(NewWord {
            word,
            uk_phonetic,
            us_phonetic,
            image_url,
            meanings,
        })
    }

    async fn extract_meanings(&self, entry: &Value) -> Vec<NewMeaning> {
        let mut meanings = Vec::new();

        for meaning in entry["meanings"].as_array().into_iter().flatten() {
            let pos = normalize_pos(meaning["partOfSpeech"].as_str().unwrap_or(""));

            let senses: Vec<String> = meaning["definitions"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|d| d["definition"].as_str())
                .map(|s| s.to_string())
                .take(MAX_SENSES)
                .collect();
            if senses.is_empty() {
                continue;
            }

            let mut translated = Vec::with_capacity(senses.len());
            for sense in &senses {
                translated.push(self.translate(sense).await);
            }

            let example_en = meaning["definitions"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|d| d["example"].as_str())
                .next()
                .unwrap_or("")
                .to_string();
            let example_cn = if example_en.is_empty() {
                String::new()
            } else {
                self.translate(&example_en).await
            };

            meanings.push(NewMeaning {
                pos,
                meaning_cn: number_senses(&translated),
                meaning_en: number_senses(&senses),
                example_en,
                example_cn,
            });
        }

        meanings
    }

    /// Best-effort English-to-Chinese translation; falls back to the
    /// source text.
    async fn translate(&self, text: &str) -> String {
        let url = format!(
            "{TRANSLATE_URL}?q={}&langpair=en|zh-CN",
            urlencoding::encode(text)
        );

        let translated = async {
            let data: Value = self.http.get(&url).send().await?.json().await?;
            Ok::<Option<String>, reqwest::Error>(
                data["responseData"]["translatedText"]
                    .as_str()
                    .map(|s| s.to_string()),
            )
        }
        .await;

        match translated {
            Ok(Some(value)) if !value.is_empty() => value,
            _ => text.to_string(),
        }
    }

    async fn fetch_image(&self, word: &str) -> Result<String, LookupError> {
        let url = format!(
            "{PIXABAY_URL}?key={}&q={}&image_type=illustration&per_page=3&safesearch=true",
            self.pixabay_key,
            urlencoding::encode(word)
        );

        let data: Value = self.http.get(&url).send().await?.json().await?;
        Ok(data["hits"][0]["webformatURL"]
            .as_str()
            .unwrap_or("")
            .to_string())
    }
}

/// Picks UK/US transcriptions from the dictionary's phonetics list,
/// classifying by the audio file name when present.
fn extract_phonetics(entry: &Value) -> (String, String) {
    let fallback = entry["phonetic"].as_str().unwrap_or("");

    let mut uk = String::new();
    let mut us = String::new();
    for phonetic in entry["phonetics"].as_array().into_iter().flatten() {
        let Some(text) = phonetic["text"].as_str().filter(|t| !t.is_empty()) else {
            continue;
        };
        let audio = phonetic["audio"].as_str().unwrap_or("");
        if audio.contains("-uk") && uk.is_empty() {
            uk = text.to_string();
        } else if audio.contains("-us") && us.is_empty() {
            us = text.to_string();
        } else if uk.is_empty() {
            uk = text.to_string();
        }
    }

    if uk.is_empty() {
        uk = fallback.to_string();
    }
    if us.is_empty() {
        us = fallback.to_string();
    }
    (uk, us)
}

fn number_senses(items: &[String]) -> String {
    if items.len() <= 1 {
        return items.first().cloned().unwrap_or_default();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n")
}
