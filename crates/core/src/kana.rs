//! Romaji to hiragana transliteration for dictionary queries.
//!
//! Typed romanized input and its kana spelling should hit the same cache
//! entry and the same index terms, so queries are normalized to kana before
//! lookup. Hepburn spellings plus the common kunrei variants are covered;
//! anything outside them (kanji, kana, digits, punctuation) passes through
//! unchanged, which leaves native-script queries as they were typed.

/// Converts romanized Japanese to hiragana.
///
/// Longest syllable wins (`sha` before `sa`), doubled consonants and `tch`
/// become the small tsu, and `n` is syllabic before a consonant, before an
/// apostrophe, or at the end of the input. An apostrophe only separates; it
/// never reaches the output. `-` becomes the long-vowel mark.
#[must_use]
pub fn to_kana(input: &str) -> String {
    let original: Vec<char> = input.chars().collect();
    let lower: Vec<char> = original.iter().map(|c| c.to_ascii_lowercase()).collect();

    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    'outer: while i < original.len() {
        let c = lower[i];

        if !c.is_ascii_alphabetic() && c != '-' && c != '\'' {
            out.push(original[i]);
            i += 1;
            continue;
        }

        if c == '-' {
            out.push('ー');
            i += 1;
            continue;
        }
        if c == '\'' {
            i += 1;
            continue;
        }

        // Doubled consonant or t-ch: small tsu, then re-read the consonant.
        if is_consonant(c) && c != 'n' {
            if lower.get(i + 1) == Some(&c) {
                out.push('っ');
                i += 1;
                continue;
            }
            if c == 't' && lower.get(i + 1) == Some(&'c') && lower.get(i + 2) == Some(&'h') {
                out.push('っ');
                i += 1;
                continue;
            }
        }

        // Syllabic n: closes the syllable unless a vowel or y follows.
        if c == 'n' {
            match lower.get(i + 1) {
                None => {
                    out.push('ん');
                    i += 1;
                    continue;
                }
                Some('\'') => {
                    out.push('ん');
                    i += 2;
                    continue;
                }
                Some(&next) if is_consonant(next) && next != 'y' => {
                    out.push('ん');
                    i += 1;
                    continue;
                }
                _ => {}
            }
        }

        for len in (1..=3).rev() {
            if i + len > lower.len() {
                continue;
            }
            let candidate: String = lower[i..i + len].iter().collect();
            if let Some(kana) = syllable(&candidate) {
                out.push_str(kana);
                i += len;
                continue 'outer;
            }
        }

        // Letters that never start a syllable (stray x, q, ...) pass through.
        out.push(original[i]);
        i += 1;
    }

    out
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !matches!(c, 'a' | 'i' | 'u' | 'e' | 'o')
}

#[allow(clippy::too_many_lines)]
fn syllable(romaji: &str) -> Option<&'static str> {
    Some(match romaji {
        "a" => "あ",
        "i" => "い",
        "u" => "う",
        "e" => "え",
        "o" => "お",

        "ka" => "か",
        "ki" => "き",
        "ku" => "く",
        "ke" => "け",
        "ko" => "こ",
        "ga" => "が",
        "gi" => "ぎ",
        "gu" => "ぐ",
        "ge" => "げ",
        "go" => "ご",

        "sa" => "さ",
        "shi" | "si" => "し",
        "su" => "す",
        "se" => "せ",
        "so" => "そ",
        "za" => "ざ",
        "ji" | "zi" => "じ",
        "zu" => "ず",
        "ze" => "ぜ",
        "zo" => "ぞ",

        "ta" => "た",
        "chi" | "ti" => "ち",
        "tsu" | "tu" => "つ",
        "te" => "て",
        "to" => "と",
        "da" => "だ",
        "di" => "ぢ",
        "du" => "づ",
        "de" => "で",
        "do" => "ど",

        "na" => "な",
        "ni" => "に",
        "nu" => "ぬ",
        "ne" => "ね",
        "no" => "の",
        "n" => "ん",

        "ha" => "は",
        "hi" => "ひ",
        "fu" | "hu" => "ふ",
        "he" => "へ",
        "ho" => "ほ",
        "ba" => "ば",
        "bi" => "び",
        "bu" => "ぶ",
        "be" => "べ",
        "bo" => "ぼ",
        "pa" => "ぱ",
        "pi" => "ぴ",
        "pu" => "ぷ",
        "pe" => "ぺ",
        "po" => "ぽ",

        "ma" => "ま",
        "mi" => "み",
        "mu" => "む",
        "me" => "め",
        "mo" => "も",

        "ya" => "や",
        "yu" => "ゆ",
        "yo" => "よ",

        "ra" => "ら",
        "ri" => "り",
        "ru" => "る",
        "re" => "れ",
        "ro" => "ろ",

        "wa" => "わ",
        "wo" => "を",

        "kya" => "きゃ",
        "kyu" => "きゅ",
        "kyo" => "きょ",
        "gya" => "ぎゃ",
        "gyu" => "ぎゅ",
        "gyo" => "ぎょ",
        "sha" | "sya" => "しゃ",
        "shu" | "syu" => "しゅ",
        "sho" | "syo" => "しょ",
        "ja" | "jya" | "zya" => "じゃ",
        "ju" | "jyu" | "zyu" => "じゅ",
        "jo" | "jyo" | "zyo" => "じょ",
        "cha" | "tya" => "ちゃ",
        "chu" | "tyu" => "ちゅ",
        "cho" | "tyo" => "ちょ",
        "nya" => "にゃ",
        "nyu" => "にゅ",
        "nyo" => "にょ",
        "hya" => "ひゃ",
        "hyu" => "ひゅ",
        "hyo" => "ひょ",
        "bya" => "びゃ",
        "byu" => "びゅ",
        "byo" => "びょ",
        "pya" => "ぴゃ",
        "pyu" => "ぴゅ",
        "pyo" => "ぴょ",
        "mya" => "みゃ",
        "myu" => "みゅ",
        "myo" => "みょ",
        "rya" => "りゃ",
        "ryu" => "りゅ",
        "ryo" => "りょ",

        _ => return None,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
