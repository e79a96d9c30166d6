//! Hangul decomposition and the composition-aware input diff.
//!
//! A syllable in U+AC00..=U+D7A3 decomposes arithmetically into choseong /
//! jungseong / jongseong. For keystroke-level comparison, compound vowels and
//! compound finals expand further into the compatibility jamo a dubeolsik
//! typist actually presses (ㅘ is ㅗ then ㅏ; ㄳ is ㄱ then ㅅ). Doubled
//! consonants (ㄲ ㄸ ㅃ ㅆ ㅉ) are a single shifted press and stay whole.

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_COUNT: u32 = 11172;
const JUNGSEONG_COUNT: u32 = 21;
const JONGSEONG_COUNT: u32 = 28;

const CHOSEONG: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ',
    'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

const JUNGSEONG: [char; 21] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ',
    'ㅞ', 'ㅟ', 'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];

// Index 0 in the syllable arithmetic means "no final"; this table starts at 1.
const JONGSEONG: [char; 27] = [
    'ㄱ', 'ㄲ', 'ㄳ', 'ㄴ', 'ㄵ', 'ㄶ', 'ㄷ', 'ㄹ', 'ㄺ', 'ㄻ', 'ㄼ', 'ㄽ', 'ㄾ', 'ㄿ', 'ㅀ',
    'ㅁ', 'ㅂ', 'ㅄ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅊ', 'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

const COMPOUND_VOWELS: [(char, [char; 2]); 7] = [
    ('ㅘ', ['ㅗ', 'ㅏ']),
    ('ㅙ', ['ㅗ', 'ㅐ']),
    ('ㅚ', ['ㅗ', 'ㅣ']),
    ('ㅝ', ['ㅜ', 'ㅓ']),
    ('ㅞ', ['ㅜ', 'ㅔ']),
    ('ㅟ', ['ㅜ', 'ㅣ']),
    ('ㅢ', ['ㅡ', 'ㅣ']),
];

const COMPOUND_FINALS: [(char, [char; 2]); 11] = [
    ('ㄳ', ['ㄱ', 'ㅅ']),
    ('ㄵ', ['ㄴ', 'ㅈ']),
    ('ㄶ', ['ㄴ', 'ㅎ']),
    ('ㄺ', ['ㄹ', 'ㄱ']),
    ('ㄻ', ['ㄹ', 'ㅁ']),
    ('ㄼ', ['ㄹ', 'ㅂ']),
    ('ㄽ', ['ㄹ', 'ㅅ']),
    ('ㄾ', ['ㄹ', 'ㅌ']),
    ('ㄿ', ['ㄹ', 'ㅍ']),
    ('ㅀ', ['ㄹ', 'ㅎ']),
    ('ㅄ', ['ㅂ', 'ㅅ']),
];

pub fn is_syllable(ch: char) -> bool {
    (ch as u32) >= SYLLABLE_BASE && (ch as u32) < SYLLABLE_BASE + SYLLABLE_COUNT
}

pub fn is_compat_jamo(ch: char) -> bool {
    ('\u{3131}'..='\u{3163}').contains(&ch)
}

pub fn is_vowel_jamo(ch: char) -> bool {
    ('\u{314F}'..='\u{3163}').contains(&ch)
}

/// (choseong, jungseong, jongseong) indices; jongseong 0 means no final.
pub fn decompose_syllable(ch: char) -> Option<(usize, usize, usize)> {
    if !is_syllable(ch) {
        return None;
    }
    let index = ch as u32 - SYLLABLE_BASE;
    let cho = index / (JUNGSEONG_COUNT * JONGSEONG_COUNT);
    let jung = (index % (JUNGSEONG_COUNT * JONGSEONG_COUNT)) / JONGSEONG_COUNT;
    let jong = index % JONGSEONG_COUNT;
    Some((cho as usize, jung as usize, jong as usize))
}

pub fn compose_syllable(cho: usize, jung: usize, jong: usize) -> char {
    let code = SYLLABLE_BASE
        + (cho as u32 * JUNGSEONG_COUNT + jung as u32) * JONGSEONG_COUNT
        + jong as u32;
    char::from_u32(code).unwrap_or('\u{FFFD}')
}

fn choseong_index(ch: char) -> Option<usize> {
    CHOSEONG.iter().position(|&c| c == ch)
}

fn jungseong_index(ch: char) -> Option<usize> {
    JUNGSEONG.iter().position(|&c| c == ch)
}

fn jongseong_index(ch: char) -> Option<usize> {
    JONGSEONG.iter().position(|&c| c == ch).map(|i| i + 1)
}

fn expand_vowel(v: char, out: &mut Vec<char>) {
    match COMPOUND_VOWELS.iter().find(|(c, _)| *c == v) {
        Some((_, parts)) => out.extend_from_slice(parts),
        None => out.push(v),
    }
}

fn expand_final(f: char, out: &mut Vec<char>) {
    match COMPOUND_FINALS.iter().find(|(c, _)| *c == f) {
        Some((_, parts)) => out.extend_from_slice(parts),
        None => out.push(f),
    }
}

fn combine_vowels(a: char, b: char) -> Option<char> {
    COMPOUND_VOWELS
        .iter()
        .find(|(_, parts)| parts[0] == a && parts[1] == b)
        .map(|(c, _)| *c)
}

fn combine_finals(a: char, b: char) -> Option<char> {
    COMPOUND_FINALS
        .iter()
        .find(|(_, parts)| parts[0] == a && parts[1] == b)
        .map(|(c, _)| *c)
}

/// The keystroke sequence that produces `ch` on a dubeolsik layout.
/// Non-Hangul characters map to themselves.
pub fn jamo_keystrokes(ch: char) -> Vec<char> {
    match decompose_syllable(ch) {
        Some((cho, jung, jong)) => {
            let mut seq = Vec::with_capacity(5);
            seq.push(CHOSEONG[cho]);
            expand_vowel(JUNGSEONG[jung], &mut seq);
            if jong > 0 {
                expand_final(JONGSEONG[jong - 1], &mut seq);
            }
            seq
        }
        None => vec![ch],
    }
}

/// True when `typed` is an intermediate input-method state on the way to
/// `target`: its keystroke sequence is a proper prefix of the target's.
/// Covers a lone jamo (ㅅ before 사) and a partial syllable (고 before 과).
pub fn is_composition_artifact(typed: char, target: char) -> bool {
    if typed == target || !is_syllable(target) {
        return false;
    }
    if !is_syllable(typed) && !is_compat_jamo(typed) {
        return false;
    }
    let typed_seq = jamo_keystrokes(typed);
    let target_seq = jamo_keystrokes(target);
    typed_seq.len() < target_seq.len() && target_seq.starts_with(&typed_seq)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    pub new_errors: u32,
    pub hard_error: bool,
}

/// Compare only the suffix added since the previous input state. Deletions
/// and in-place recompositions (사 becoming 삭) introduce no new positions
/// and therefore never add errors; the error ledger is append-only. Input
/// beyond the target length is ignored.
pub fn diff_new_input(target: &[char], prev_len: usize, input: &[char]) -> DiffOutcome {
    let mut outcome = DiffOutcome::default();
    let end = input.len().min(target.len());
    for i in prev_len.min(end)..end {
        if input[i] == target[i] || is_composition_artifact(input[i], target[i]) {
            continue;
        }
        outcome.new_errors += 1;
        outcome.hard_error = true;
    }
    outcome
}

/// NFC-normalize raw input so terminals that deliver conjoining jamo
/// sequences compare equal to precomposed text.
pub fn normalize(text: &str) -> String {
    icu_normalizer::ComposingNormalizer::new_nfc()
        .normalize(text)
        .into_owned()
}

/// Recompose a keystroke sequence into a single syllable, if it forms one.
fn recompose(seq: &[char]) -> Option<char> {
    let (&first, rest) = seq.split_first()?;
    let cho = choseong_index(first)?;
    let (&v1, rest) = rest.split_first()?;
    if !is_vowel_jamo(v1) {
        return None;
    }
    let (vowel, rest) = match rest.first() {
        Some(&v2) if is_vowel_jamo(v2) => (combine_vowels(v1, v2)?, &rest[1..]),
        _ => (v1, rest),
    };
    let jung = jungseong_index(vowel)?;
    let jong = match rest {
        [] => 0,
        [f] => jongseong_index(*f)?,
        [f1, f2] => jongseong_index(combine_finals(*f1, *f2)?)?,
        _ => return None,
    };
    Some(compose_syllable(cho, jung, jong))
}

/// Append one keystroke to the buffer, combining with the trailing unit the
/// way a dubeolsik input method would. A vowel after a closed syllable
/// steals its trailing consonant (삭 then ㅗ becomes 사고).
pub fn compose_push(buf: &mut Vec<char>, ch: char) {
    if is_compat_jamo(ch)
        && let Some(&last) = buf.last()
        && (is_syllable(last) || is_compat_jamo(last))
    {
        let mut seq = jamo_keystrokes(last);
        seq.push(ch);
        if let Some(sy) = recompose(&seq) {
            *buf.last_mut().unwrap() = sy;
            return;
        }
        if is_vowel_jamo(ch)
            && let Some((cho, jung, jong)) = decompose_syllable(last)
            && jong > 0
        {
            let mut final_seq = Vec::new();
            expand_final(JONGSEONG[jong - 1], &mut final_seq);
            let stolen = *final_seq.last().unwrap();
            let remaining_jong = if final_seq.len() == 2 {
                jongseong_index(final_seq[0]).unwrap_or(0)
            } else {
                0
            };
            if choseong_index(stolen).is_some()
                && let Some(new_sy) = recompose(&[stolen, ch])
            {
                *buf.last_mut().unwrap() = compose_syllable(cho, jung, remaining_jong);
                buf.push(new_sy);
                return;
            }
        }
    }
    buf.push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_basic_syllable() {
        // 사 = ㅅ + ㅏ, no final
        let (cho, jung, jong) = decompose_syllable('사').unwrap();
        assert_eq!(CHOSEONG[cho], 'ㅅ');
        assert_eq!(JUNGSEONG[jung], 'ㅏ');
        assert_eq!(jong, 0);
        assert_eq!(compose_syllable(cho, jung, jong), '사');
    }

    #[test]
    fn keystrokes_expand_compounds() {
        assert_eq!(jamo_keystrokes('과'), vec!['ㄱ', 'ㅗ', 'ㅏ']);
        assert_eq!(jamo_keystrokes('값'), vec!['ㄱ', 'ㅏ', 'ㅂ', 'ㅅ']);
        assert_eq!(jamo_keystrokes('흙'), vec!['ㅎ', 'ㅡ', 'ㄹ', 'ㄱ']);
        // Doubled consonants are one shifted press
        assert_eq!(jamo_keystrokes('싸'), vec!['ㅆ', 'ㅏ']);
        assert_eq!(jamo_keystrokes('a'), vec!['a']);
    }

    #[test]
    fn lone_jamo_is_artifact_of_matching_syllable() {
        assert!(is_composition_artifact('ㅅ', '사'));
        assert!(!is_composition_artifact('ㄱ', '사'));
    }

    #[test]
    fn partial_syllable_is_artifact_of_compound_target() {
        assert!(is_composition_artifact('고', '과'));
        assert!(is_composition_artifact('가', '값'));
        assert!(is_composition_artifact('갑', '값'));
        assert!(!is_composition_artifact('간', '값'));
    }

    #[test]
    fn equal_or_longer_unit_is_not_artifact() {
        assert!(!is_composition_artifact('사', '사'));
        assert!(!is_composition_artifact('삭', '사'));
        assert!(!is_composition_artifact('x', '사'));
        assert!(!is_composition_artifact('ㅅ', 'x'));
    }

    #[test]
    fn diff_clean_prefix_has_no_errors() {
        let target: Vec<char> = "사과".chars().collect();
        assert_eq!(diff_new_input(&target, 0, &['사']).new_errors, 0);
        assert_eq!(diff_new_input(&target, 1, &['사', '과']).new_errors, 0);
    }

    #[test]
    fn diff_suppresses_composition_noise() {
        let target: Vec<char> = "사과".chars().collect();
        // Intermediate states while assembling 과 at position 1
        for state in ['ㄱ', '고'] {
            let outcome = diff_new_input(&target, 1, &['사', state]);
            assert_eq!(outcome.new_errors, 0, "suppressed: {state}");
            assert!(!outcome.hard_error);
        }
    }

    #[test]
    fn diff_counts_genuine_mistakes() {
        let target: Vec<char> = "사과".chars().collect();
        let outcome = diff_new_input(&target, 1, &['사', '나']);
        assert_eq!(outcome.new_errors, 1);
        assert!(outcome.hard_error);
    }

    #[test]
    fn diff_only_scans_new_positions() {
        let target: Vec<char> = "사과".chars().collect();
        // Position 0 is wrong, but it predates prev_len and is already counted.
        let outcome = diff_new_input(&target, 1, &['나', '과']);
        assert_eq!(outcome.new_errors, 0);
    }

    #[test]
    fn diff_ignores_overflow_beyond_target() {
        let target: Vec<char> = "물".chars().collect();
        let outcome = diff_new_input(&target, 1, &['물', '물', '물']);
        assert_eq!(outcome.new_errors, 0);
    }

    #[test]
    fn normalize_composes_conjoining_jamo() {
        // U+1109 U+1161 (conjoining ᄉ ᅡ) composes to 사
        let decomposed = "\u{1109}\u{1161}";
        assert_eq!(normalize(decomposed), "사");
    }

    #[test]
    fn compose_push_builds_syllables() {
        let mut buf = Vec::new();
        compose_push(&mut buf, 'ㅅ');
        assert_eq!(buf, vec!['ㅅ']);
        compose_push(&mut buf, 'ㅏ');
        assert_eq!(buf, vec!['사']);
        compose_push(&mut buf, 'ㄴ');
        assert_eq!(buf, vec!['산']);
    }

    #[test]
    fn compose_push_steals_final_before_vowel() {
        // 사 + ㄱ + ㅗ + ㅏ → 사과
        let mut buf = vec!['사'];
        compose_push(&mut buf, 'ㄱ');
        assert_eq!(buf, vec!['삭']);
        compose_push(&mut buf, 'ㅗ');
        assert_eq!(buf, vec!['사', '고']);
        compose_push(&mut buf, 'ㅏ');
        assert_eq!(buf, vec!['사', '과']);
    }

    #[test]
    fn compose_push_compound_final_split() {
        // 흙 + ㅣ → 흘기
        let mut buf = vec!['흙'];
        compose_push(&mut buf, 'ㅣ');
        assert_eq!(buf, vec!['흘', '기']);
    }

    #[test]
    fn compose_push_non_jamo_appends() {
        let mut buf = vec!['사'];
        compose_push(&mut buf, 'x');
        assert_eq!(buf, vec!['사', 'x']);
    }
}
