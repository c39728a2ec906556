use rustc_hash::FxHashSet;

/// Native object names handed out by backends that emulate name generation.
///
/// Names start at 1; 0 stays reserved for "no object", as in GL. Released
/// names are reused before new ones are minted, most recently released first.
/// Releasing a name that is not live is refused, so one stale handle cannot
/// end up shared by two objects.
///
/// ```ignore
/// let mut names = NameAllocator::new();
/// let fbo = names.generate();   // 1
/// let query = names.generate(); // 2
/// names.release(fbo);
/// assert_eq!(names.generate(), fbo);
/// ```
#[derive(Debug, Default)]
pub struct NameAllocator {
    released: Vec<u32>,
    live: FxHashSet<u32>,
    minted: u32,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free name, never 0
    pub fn generate(&mut self) -> u32 {
        let name = match self.released.pop() {
            Some(name) => name,
            None => {
                self.minted += 1;
                self.minted
            }
        };
        self.live.insert(name);
        name
    }

    /// Give `name` back; false if it was not live
    pub fn release(&mut self, name: u32) -> bool {
        if !self.live.remove(&name) {
            return false;
        }
        self.released.push(name);
        true
    }

    pub fn is_live(&self, name: u32) -> bool {
        self.live.contains(&name)
    }

    /// Names currently in use
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Largest name ever generated
    pub fn highest(&self) -> u32 {
        self.minted
    }
}

#[cfg(test)]
#[path = "name_allocator_tests.rs"]
mod tests;
