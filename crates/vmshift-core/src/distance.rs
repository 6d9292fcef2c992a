/// Weighted Levenshtein distance.
///
/// Costs apply per Unicode scalar value. With all weights at 1 this is the
/// standard Levenshtein distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDistance {
    insertion: usize,
    deletion: usize,
    substitution: usize,
}

impl Default for EditDistance {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl EditDistance {
    pub const fn new(insertion: usize, deletion: usize, substitution: usize) -> Self {
        Self {
            insertion,
            deletion,
            substitution,
        }
    }

    /// Minimum total cost of turning `a` into `b`.
    pub fn distance(&self, a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let cols = b.len() + 1;

        // Row-major (a.len() + 1) x (b.len() + 1) cost table.
        let mut table = vec![0usize; (a.len() + 1) * cols];
        for j in 1..cols {
            table[j] = table[j - 1] + self.insertion;
        }
        for i in 1..=a.len() {
            table[i * cols] = table[(i - 1) * cols] + self.deletion;
            for j in 1..cols {
                let substitute = if a[i - 1] == b[j - 1] {
                    table[(i - 1) * cols + (j - 1)]
                } else {
                    table[(i - 1) * cols + (j - 1)] + self.substitution
                };
                let delete = table[(i - 1) * cols + j] + self.deletion;
                let insert = table[i * cols + (j - 1)] + self.insertion;
                table[i * cols + j] = substitute.min(delete).min(insert);
            }
        }

        table[a.len() * cols + b.len()]
    }
}
