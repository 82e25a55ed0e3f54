use super::{FlagDef, FlagId};

/// Number of hash buckets.
pub const NUM_BUCKETS: usize = 277;

/// Polynomial string hash folded to the 16-bit fragment stored per flag.
pub const fn hash_fragment(name: &str) -> u16 {
	let bytes = name.as_bytes();
	let mut h: u32 = 0;
	let mut i = 0;
	while i < bytes.len() {
		h = h.wrapping_mul(31).wrapping_add(bytes[i] as u32);
		i += 1;
	}
	h as u16
}

const fn bucket_of(fragment: u16) -> usize {
	fragment as usize % NUM_BUCKETS
}

/// Bigram similarity between two names in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
	strsim::sorensen_dice(a, b)
}

/// Hash index over a descriptor table.
///
/// Chains keep table order. A hit requires an equal fragment, an equal length
/// and equal bytes.
#[derive(Debug)]
pub struct LookupIndex {
	buckets: Vec<Vec<FlagId>>,
	fragments: Vec<u16>,
}

impl LookupIndex {
	pub fn new(defs: &[FlagDef]) -> Self {
		let mut buckets = vec![Vec::new(); NUM_BUCKETS];
		let mut fragments = Vec::with_capacity(defs.len());
		for (i, def) in defs.iter().enumerate() {
			let fragment = hash_fragment(def.name);
			fragments.push(fragment);
			buckets[bucket_of(fragment)].push(FlagId::new(i as u16));
		}
		Self { buckets, fragments }
	}

	pub fn find(&self, defs: &[FlagDef], name: &str) -> Option<FlagId> {
		let fragment = hash_fragment(name);
		self.buckets[bucket_of(fragment)].iter().copied().find(|id| {
			self.fragments[id.index()] == fragment && {
				let stored = defs[id.index()].name;
				stored.len() == name.len() && stored == name
			}
		})
	}

	/// Length of the longest chain.
	pub fn max_chain(&self) -> usize {
		self.buckets.iter().map(Vec::len).max().unwrap_or(0)
	}
}

/// Scans every descriptor and returns the first best-scoring one.
pub(super) fn closest(defs: &[FlagDef], name: &str) -> Option<(FlagId, f64)> {
	let mut best: Option<(FlagId, f64)> = None;
	for (i, def) in defs.iter().enumerate() {
		let score = similarity(def.name, name);
		if best.is_none_or(|(_, max)| score > max) {
			best = Some((FlagId::new(i as u16), score));
		}
	}
	best
}
