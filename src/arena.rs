// Session arena for parse-time payloads
//
// Hands out 8-byte-aligned byte ranges from a chain of fixed-capacity
// buckets. A bucket never reallocates, so every range handed out stays
// valid and its contents stay stable until the arena is dropped. Growth
// only appends buckets; the whole arena is freed as one unit.

/// Default capacity of the first bucket, in bytes.
pub const DEFAULT_BUCKET_BYTES: usize = 1024;

const ALIGN: usize = 8;

/// Opaque handle to a byte range inside an [`Arena`].
///
/// Handles stay valid for the arena's whole lifetime; there is no way to
/// free an individual allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRef {
    bucket: u32,
    offset: u32,
    len: u32,
}

impl TextRef {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// One fixed-capacity segment of the arena. The boxed storage is
// over-allocated by ALIGN so that `base` can point at the first 8-byte
// boundary inside it; offsets are measured from `base`.
struct Bucket {
    data: Box<[u8]>,
    base: usize,
    cap: usize,
    used: usize,
}

impl Bucket {
    fn with_capacity(bytes: usize) -> Self {
        let data = vec![0u8; bytes + ALIGN].into_boxed_slice();
        let base = data.as_ptr().align_offset(ALIGN);
        Self {
            data,
            base,
            cap: bytes,
            used: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.cap
    }

    /// Bump the cursor for `size` bytes, aligning the start up to the
    /// next multiple of 8. Returns the byte offset of the range, or None
    /// when the aligned request does not fit before the bucket's end.
    fn try_bump(&mut self, size: usize) -> Option<usize> {
        let aligned = self.used.next_multiple_of(ALIGN);
        let end = aligned.checked_add(size)?;
        if end > self.capacity() {
            return None;
        }
        self.used = end;
        Some(aligned)
    }

    fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[self.base + offset..self.base + offset + len]
    }

    fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.data[self.base + offset..self.base + offset + len]
    }
}

/// Bump allocator over a chain of fixed-capacity buckets.
///
/// Each allocation starts on an 8-byte boundary. When no bucket in the
/// chain has room, a new bucket of `max(size, 1.5 x previous)` bytes is
/// appended, so a single oversized request always gets a bucket big
/// enough to hold it.
pub struct Arena {
    buckets: Vec<Bucket>,
    first_bucket_bytes: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_bucket_bytes(DEFAULT_BUCKET_BYTES)
    }

    /// Create an arena whose first bucket holds `bytes` bytes.
    pub fn with_bucket_bytes(bytes: usize) -> Self {
        Self {
            buckets: Vec::new(),
            first_bucket_bytes: bytes.max(ALIGN),
        }
    }

    /// Allocate `size` bytes, growing the chain on demand.
    ///
    /// The chain is walked front to back and the request is satisfied by
    /// the first bucket with room; exhausted buckets are skipped, never
    /// compacted or reused for ranges already handed out.
    pub fn alloc(&mut self, size: usize) -> TextRef {
        for (index, bucket) in self.buckets.iter_mut().enumerate() {
            if let Some(offset) = bucket.try_bump(size) {
                return TextRef {
                    bucket: index as u32,
                    offset: offset as u32,
                    len: size as u32,
                };
            }
        }

        // No bucket fits: append one. A request larger than the growth
        // rule would produce gets a bucket sized to the request itself.
        let prev = self
            .buckets
            .last()
            .map(Bucket::capacity)
            .unwrap_or(self.first_bucket_bytes);
        let next_len = (prev / 2 + prev).max(size).max(self.first_bucket_bytes);
        let mut bucket = Bucket::with_capacity(next_len);
        let offset = match bucket.try_bump(size) {
            Some(offset) => offset,
            // A fresh bucket sized >= size always fits the request.
            None => unreachable!("fresh bucket cannot be too small"),
        };
        self.buckets.push(bucket);

        TextRef {
            bucket: (self.buckets.len() - 1) as u32,
            offset: offset as u32,
            len: size as u32,
        }
    }

    /// Copy a string into the arena and return its handle.
    pub fn alloc_str(&mut self, s: &str) -> TextRef {
        let text_ref = self.alloc(s.len());
        self.bytes_mut(text_ref).copy_from_slice(s.as_bytes());
        text_ref
    }

    pub fn bytes(&self, r: TextRef) -> &[u8] {
        self.buckets[r.bucket as usize].slice(r.offset as usize, r.len as usize)
    }

    fn bytes_mut(&mut self, r: TextRef) -> &mut [u8] {
        self.buckets[r.bucket as usize].slice_mut(r.offset as usize, r.len as usize)
    }

    /// Resolve a handle produced by [`Arena::alloc_str`].
    pub fn text(&self, r: TextRef) -> &str {
        std::str::from_utf8(self.bytes(r)).expect("arena text is valid UTF-8")
    }

    /// Number of buckets currently chained.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("buckets", &self.buckets.len())
            .field(
                "capacity",
                &self.buckets.iter().map(Bucket::capacity).sum::<usize>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address_of(arena: &Arena, r: TextRef) -> usize {
        arena.bytes(r).as_ptr() as usize
    }

    #[test]
    fn test_allocations_are_8_byte_aligned() {
        let mut arena = Arena::new();
        for size in [1, 2, 3, 7, 8, 9, 15, 16, 63, 100] {
            let r = arena.alloc(size);
            assert_eq!(
                address_of(&arena, r) % 8,
                0,
                "allocation of {} bytes not aligned",
                size
            );
            assert_eq!(arena.bytes(r).len(), size);
        }
    }

    #[test]
    fn test_contents_stable_across_growth() {
        let mut arena = Arena::with_bucket_bytes(64);

        let first = arena.alloc_str("hello");
        let first_addr = address_of(&arena, first);

        // Force several rounds of bucket growth.
        let mut later = Vec::new();
        for i in 0..100 {
            later.push((i, arena.alloc_str(&format!("payload-{}", i))));
        }

        assert_eq!(arena.text(first), "hello");
        assert_eq!(address_of(&arena, first), first_addr);
        for (i, r) in later {
            assert_eq!(arena.text(r), format!("payload-{}", i));
        }
        assert!(arena.bucket_count() > 1);
    }

    #[test]
    fn test_oversized_request_gets_its_own_bucket() {
        let mut arena = Arena::with_bucket_bytes(32);
        let small = arena.alloc_str("abc");

        // Far larger than the growth rule would produce from a 32-byte chain.
        let big = arena.alloc(4096);
        assert_eq!(arena.bytes(big).len(), 4096);
        assert_eq!(address_of(&arena, big) % 8, 0);

        // The earlier allocation is untouched.
        assert_eq!(arena.text(small), "abc");
    }

    #[test]
    fn test_no_aliasing_between_allocations() {
        // Small buckets so the second and third strings trigger growth;
        // each write must land in fresh memory, never over a live range.
        let mut arena = Arena::with_bucket_bytes(16);
        let a = arena.alloc_str("aaaa");
        let b = arena.alloc_str("bbbb");
        let c = arena.alloc_str("cccc");

        assert_eq!(arena.text(a), "aaaa");
        assert_eq!(arena.text(b), "bbbb");
        assert_eq!(arena.text(c), "cccc");
    }

    #[test]
    fn test_zero_sized_allocation() {
        let mut arena = Arena::new();
        let r = arena.alloc(0);
        assert!(r.is_empty());
        assert_eq!(arena.bytes(r).len(), 0);
    }

    #[test]
    fn test_exhausted_buckets_are_skipped_not_reused() {
        let mut arena = Arena::with_bucket_bytes(24);
        let a = arena.alloc_str("0123456789abcdef"); // 16 bytes
        let b = arena.alloc(24); // does not fit after `a`, grows
        assert!(arena.bucket_count() >= 2);
        assert_eq!(arena.text(a), "0123456789abcdef");
        assert_eq!(arena.bytes(b).len(), 24);
    }
}
