//! Enumeration of the ways a whitespace-separated phrase can be read as a
//! sequence of contiguous sub-phrases, and the deduplicated list of those
//! sub-phrases sorted by descending strength of evidence.

/// One way of grouping `n` words into contiguous runs. Each inner `Vec<&str>`
/// is one run (sub-phrase); the runs cover the words in order.
pub type Partition<'a> = Vec<Vec<&'a str>>;

/// Every ordered partition of `phrase`'s words into contiguous groups.
///
/// For `n` words there are exactly `2^(n-1)` partitions: a composition of
/// `n` corresponds one-to-one with a choice of "cut" or "no cut" between
/// each of the `n - 1` adjacent word pairs.
pub fn string_partitions(phrase: &str) -> Vec<Partition<'_>> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let n = words.len();
    let cuts = n.saturating_sub(1);
    let mut partitions = Vec::with_capacity(1usize << cuts);

    for mask in 0..(1usize << cuts) {
        let mut partition = Vec::new();
        let mut run_start = 0;
        for i in 0..cuts {
            if mask & (1 << i) != 0 {
                partition.push(words[run_start..=i].to_vec());
                run_start = i + 1;
            }
        }
        partition.push(words[run_start..n].to_vec());
        partitions.push(partition);
    }

    partitions
}

/// Deduplicated list of every contiguous sub-phrase appearing in any
/// partition of `phrase`, sorted by descending word count then
/// lexicographically. Longer sub-phrases are tried first: they are stronger
/// evidence of a real place name.
pub fn word_combinations(phrase: &str) -> Vec<String> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let n = words.len();

    let mut combinations: Vec<String> = Vec::new();
    for start in 0..n {
        for end in start..n {
            combinations.push(words[start..=end].join(" "));
        }
    }

    combinations.sort();
    combinations.dedup();
    combinations.sort_by(|a, b| {
        let a_len = a.split_whitespace().count();
        let b_len = b.split_whitespace().count();
        b_len.cmp(&a_len).then_with(|| a.cmp(b))
    });
    combinations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_words_example() {
        let partitions = string_partitions("a b c");
        let rendered: Vec<Vec<String>> = partitions
            .iter()
            .map(|p| p.iter().map(|run| run.join(" ")).collect())
            .collect();

        assert_eq!(rendered.len(), 4);
        assert!(rendered.contains(&vec!["a".to_string(), "b".to_string(), "c".to_string()]));
        assert!(rendered.contains(&vec!["a b".to_string(), "c".to_string()]));
        assert!(rendered.contains(&vec!["a".to_string(), "b c".to_string()]));
        assert!(rendered.contains(&vec!["a b c".to_string()]));
    }

    #[test]
    fn partition_count_is_power_of_two() {
        for n in 1..=10 {
            let words = vec!["w"; n].join(" ");
            assert_eq!(string_partitions(&words).len(), 1usize << (n - 1));
        }
    }

    #[test]
    fn empty_phrase_has_no_partitions() {
        assert!(string_partitions("").is_empty());
        assert!(string_partitions("   ").is_empty());
    }

    #[test]
    fn combinations_are_contiguous_and_deduplicated() {
        let combos = word_combinations("rio de janero");
        assert_eq!(combos, vec![
            "rio de janero",
            "de janero",
            "rio de",
            "de",
            "janero",
            "rio",
        ]);
    }

    #[test]
    fn combinations_sorted_by_length_then_lexicographically() {
        let combos = word_combinations("a b");
        assert_eq!(combos, vec!["a b", "a", "b"]);
    }
}
