#![forbid(unsafe_code)]

use std::sync::{PoisonError, RwLock};

use log::info;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// The greeting value served before any update arrives.
pub const DEFAULT_GREETING: &str = "Hello World!";

// ***************************************************************************
//                              GreetingStore
// ***************************************************************************
// ---------------------------------------------------------------------------
// GreetingStore:
// ---------------------------------------------------------------------------
/** The single shared mutable value in the server.  The store holds exactly
 * one string and is safe under concurrent access from all request handler
 * tasks.  Each get and set takes effect atomically; concurrent sets are
 * applied in some serial order and readers never observe a torn value.
 *
 * The store is constructed once in main and handed to the endpoint
 * structs as an Arc, so the greeting has no global static footprint.
 */
#[derive(Debug)]
pub struct GreetingStore {
    greeting: RwLock<String>,
}

impl GreetingStore {
    // ---------------------------------------------------------------------------
    // new:
    // ---------------------------------------------------------------------------
    /** Create a store seeded with the given greeting. */
    pub fn new(initial: &str) -> Self {
        Self { greeting: RwLock::new(initial.to_string()) }
    }

    // ---------------------------------------------------------------------------
    // get:
    // ---------------------------------------------------------------------------
    /** Return the current greeting.  This call cannot fail:  a poisoned lock
     * only means a writer panicked mid-update, and since the guarded value is
     * always a complete string we just take it as is.
     */
    pub fn get(&self) -> String {
        let guard = self.greeting.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    // ---------------------------------------------------------------------------
    // set:
    // ---------------------------------------------------------------------------
    /** Unconditionally replace the greeting.  Any string is accepted,
     * including the empty string.  One log record is written per change.
     */
    pub fn set(&self, new_greeting: String) {
        // Log outside the critical section.
        info!("Greeting set to {}", new_greeting);

        let mut guard = self.greeting.write().unwrap_or_else(PoisonError::into_inner);
        *guard = new_greeting;
    }
}

impl Default for GreetingStore {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn default_greeting() {
        let store = GreetingStore::default();
        assert_eq!(store.get(), DEFAULT_GREETING);
    }

    #[test]
    fn set_then_get() {
        let store = GreetingStore::default();
        store.set("Hi there".to_string());
        assert_eq!(store.get(), "Hi there");
    }

    #[test]
    fn set_accepts_any_string() {
        let store = GreetingStore::default();

        store.set(String::new());
        assert_eq!(store.get(), "");

        store.set("he said \"hello\"".to_string());
        assert_eq!(store.get(), "he said \"hello\"");

        store.set("здравей, 世界".to_string());
        assert_eq!(store.get(), "здравей, 世界");
    }

    #[test]
    fn set_is_idempotent() {
        let store = GreetingStore::default();
        store.set("Howdy".to_string());
        store.set("Howdy".to_string());
        assert_eq!(store.get(), "Howdy");
    }

    #[test]
    fn concurrent_sets_leave_one_complete_value() {
        const WRITERS: usize = 16;

        let store = Arc::new(GreetingStore::default());
        let mut handles = Vec::with_capacity(WRITERS);
        for i in 0..WRITERS {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store.set(format!("greeting-{}", i));
            }));
        }
        for h in handles {
            h.join().expect("writer thread panicked");
        }

        // After all writers complete the store holds exactly one of the
        // written values, never a mixture.
        let value = store.get();
        let expected: Vec<String> = (0..WRITERS).map(|i| format!("greeting-{}", i)).collect();
        assert!(expected.contains(&value), "unexpected greeting: {}", value);
    }

    #[test]
    fn concurrent_readers_see_complete_values() {
        const READERS: usize = 8;
        const ROUNDS: usize = 200;

        let store = Arc::new(GreetingStore::default());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    store.set(format!("round-{}", i));
                }
            })
        };

        let mut readers = Vec::with_capacity(READERS);
        for _ in 0..READERS {
            let store = Arc::clone(&store);
            readers.push(thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let v = store.get();
                    assert!(v == DEFAULT_GREETING || v.starts_with("round-"), "torn value: {}", v);
                }
            }));
        }

        writer.join().expect("writer thread panicked");
        for r in readers {
            r.join().expect("reader thread panicked");
        }
    }
}
