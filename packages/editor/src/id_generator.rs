use crc32fast::Hasher;

/// Seed derived from a page id using CRC32
pub fn get_page_seed(page_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(page_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential shape ID generator scoped to one page
#[derive(Debug, Clone)]
pub struct IDGenerator {
    seed: String,
    count: u32,
}

impl IDGenerator {
    pub fn new(page_id: &str) -> Self {
        Self {
            seed: get_page_seed(page_id),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("shape:{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_seed_is_stable() {
        assert_eq!(get_page_seed("page:1"), get_page_seed("page:1"));
        assert_ne!(get_page_seed("page:1"), get_page_seed("page:2"));
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = IDGenerator::new("page:1");
        let first = ids.new_id();
        let second = ids.new_id();

        assert!(first.starts_with(&format!("shape:{}", ids.seed())));
        assert!(first.ends_with("-1"));
        assert!(second.ends_with("-2"));
    }
}
