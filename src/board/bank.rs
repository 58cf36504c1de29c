// Several shift register chains behind one controller.
//
// Boards often share data and clock between chains and give each chain
// its own load line (or share everything but address chains through a
// decoder). The bank owns the line state; each chain is addressed by a
// lightweight ChainRef, which is the device reference handed to a Sipo
// context. A transfer holds the critical section for its whole
// duration, so mainline and ISR writers never interleave on shared lines.

use core::cell::RefCell;
use core::fmt;

use embedded_hal::digital::PinState;

use super::{SipoLines, SipoMap, Transfer};

/// Per-chain line operations of a multi-chain controller.
pub trait SipoBank {
    /// Identifies one chain on this controller.
    type Chain: Copy + fmt::Debug;
    type Error: fmt::Debug;

    fn set_data(&mut self, chain: Self::Chain, level: PinState) -> Result<(), Self::Error>;
    fn set_clock(&mut self, chain: Self::Chain, level: PinState) -> Result<(), Self::Error>;
    fn set_load(&mut self, chain: Self::Chain, level: PinState) -> Result<(), Self::Error>;

    fn hold(&mut self, _chain: Self::Chain) {}
}

pub struct SharedBank<B> {
    inner: critical_section::Mutex<RefCell<B>>,
}

impl<B: SipoBank> SharedBank<B> {
    pub const fn new(bank: B) -> Self {
        Self {
            inner: critical_section::Mutex::new(RefCell::new(bank)),
        }
    }

    /// Device reference for one chain.
    pub fn chain(&self, chain: B::Chain) -> ChainRef<'_, B> {
        ChainRef { bank: self, chain }
    }

    /// Direct access to the controller, e.g. for board-level pin setup.
    pub fn lock<T>(&self, f: impl FnOnce(&mut B) -> T) -> T {
        critical_section::with(|cs| f(&mut *self.inner.borrow_ref_mut(cs)))
    }

    pub fn into_inner(self) -> B {
        self.inner.into_inner().into_inner()
    }
}

pub struct ChainRef<'a, B: SipoBank> {
    bank: &'a SharedBank<B>,
    chain: B::Chain,
}

impl<B: SipoBank> ChainRef<'_, B> {
    pub fn id(&self) -> B::Chain {
        self.chain
    }
}

impl<B: SipoBank> Clone for ChainRef<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: SipoBank> Copy for ChainRef<'_, B> {}

impl<B: SipoBank> fmt::Debug for ChainRef<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChainRef").field(&self.chain).finish()
    }
}

// Lines of one chain while the bank is locked.
struct BankLines<'b, B: SipoBank> {
    bank: &'b mut B,
    chain: B::Chain,
}

impl<B: SipoBank> SipoLines for BankLines<'_, B> {
    type Error = B::Error;

    #[inline]
    fn set_data(&mut self, level: PinState) -> Result<(), B::Error> {
        self.bank.set_data(self.chain, level)
    }

    #[inline]
    fn set_clock(&mut self, level: PinState) -> Result<(), B::Error> {
        self.bank.set_clock(self.chain, level)
    }

    #[inline]
    fn set_load(&mut self, level: PinState) -> Result<(), B::Error> {
        self.bank.set_load(self.chain, level)
    }

    #[inline]
    fn hold(&mut self) {
        self.bank.hold(self.chain)
    }
}

impl<B: SipoBank> SipoMap for ChainRef<'_, B> {
    type Error = B::Error;

    fn with_lines<T: Transfer<B::Error>>(&mut self, t: T) -> T::Output {
        let chain = self.chain;
        critical_section::with(|cs| {
            // panics on re-entry from inside a transfer
            let mut bank = self.bank.inner.borrow_ref_mut(cs);
            let mut lines = BankLines {
                bank: &mut *bank,
                chain,
            };
            t.run(&mut lines)
        })
    }
}
