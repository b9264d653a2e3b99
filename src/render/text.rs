// Post text and image description.
// Spells out the region count and names the holiday theme, if any.

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// English cardinal for `n`, e.g. `42` -> `"forty-two"`.
pub fn number_words(n: usize) -> String {
    match n {
        0..=19 => ONES[n].to_string(),
        20..=99 => {
            let tens = TENS[n / 10];
            match n % 10 {
                0 => tens.to_string(),
                ones => format!("{}-{}", tens, ONES[ones]),
            }
        }
        100..=999 => {
            let hundreds = format!("{} hundred", ONES[n / 100]);
            match n % 100 {
                0 => hundreds,
                rest => format!("{} and {}", hundreds, number_words(rest)),
            }
        }
        _ => n.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Status text, e.g. `"Twelve Californias"`.
pub fn post_text(n: usize) -> String {
    format!("{} Californias", capitalize(&number_words(n)))
}

/// Join words as `a`, `a and b`, or `a, b, and c`.
pub fn join_keywords(keywords: &[&str]) -> String {
    match keywords {
        [] => String::new(),
        [only] => only.to_string(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Alt text for the map image.
pub fn image_description(n: usize, keywords: Option<&[&str]>) -> String {
    match keywords {
        None => format!(
            "A map of California, where the counties are {} different colors",
            n
        ),
        Some(kws) => format!(
            "A map of California, where the counties are {} different shades of {}",
            n,
            join_keywords(kws)
        ),
    }
}
