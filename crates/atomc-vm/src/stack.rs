use atomc_util::RuntimeError;

/// A logical address, never a raw index into `container`. `Global` and
/// `Frame` are separate address spaces: the former resolves against the
/// globals vector, the latter against `container` relative to whatever
/// `fp` is current when the address is dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addr {
    Global(usize),
    Frame(isize),
}

impl Addr {
    /// Shifts an address by `delta` slots, used by `OFFSET` to turn a base
    /// array/struct address plus a runtime index into the element address —
    /// the one piece of address arithmetic AtomC's indexing needs, kept
    /// inside this tagged type rather than exposed as raw pointers.
    pub fn shift(self, delta: i64) -> Addr {
        match self {
            Addr::Global(i) => Addr::Global((i as i64 + delta) as usize),
            Addr::Frame(o) => Addr::Frame(o + delta as isize),
        }
    }
}

/// An execution-stack cell. Tagged, per the chosen boxed-cell design: the
/// VM is typed by opcode, but cells still need to distinguish a plain
/// number from a logical address or frame metadata so `pop`/arithmetic
/// can't silently operate on the wrong kind of value.
#[derive(Debug, Clone, Copy)]
pub enum StackValue {
    Int(i64),
    Float(f64),
    Addr(Addr),
}

impl StackValue {
    pub fn as_int(self) -> Result<i64, RuntimeError> {
        match self {
            StackValue::Int(v) => Ok(v),
            _ => Err(RuntimeError::OutOfBounds),
        }
    }

    pub fn as_float(self) -> Result<f64, RuntimeError> {
        match self {
            StackValue::Float(v) => Ok(v),
            _ => Err(RuntimeError::OutOfBounds),
        }
    }

    pub fn as_addr(self) -> Result<Addr, RuntimeError> {
        match self {
            StackValue::Addr(a) => Ok(a),
            _ => Err(RuntimeError::OutOfBounds),
        }
    }
}

/// The execution stack plus the separate globals vector, per the memory
/// model: `fp`/`sp` index `container`; `ADDR`/global `LOAD`/`STORE` index
/// `globals`, a logically distinct address space.
///
/// Return addresses live on their own `returns` channel rather than in
/// `container`: `CALL`'s arguments are the only thing below `fp` that
/// `FPLOAD`/`FPSTORE` ever need to reach, so keeping the return address off
/// to the side lets the first-declared parameter sit at offset `-1` with no
/// off-by-one from call bookkeeping. Callers push arguments right-to-left so
/// that first-declared still ends up closest to `fp`; `RET`/`RET_VOID`'s
/// `nparams` operand tells `recover_function_frame` how many of those
/// argument slots to discard once the frame is torn down.
pub struct ExecStack {
    container: Vec<StackValue>,
    sp: isize,
    fp: isize,
    globals: Vec<StackValue>,
    returns: Vec<isize>,
}

impl Default for ExecStack {
    fn default() -> Self {
        Self {
            container: Vec::new(),
            sp: -1,
            fp: -1,
            globals: Vec::new(),
            returns: Vec::new(),
        }
    }
}

impl ExecStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        (self.sp + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.sp == -1
    }

    pub fn push(&mut self, value: StackValue) {
        self.sp += 1;
        self.container.push(value);
    }

    pub fn pop(&mut self) -> Result<StackValue, RuntimeError> {
        if self.sp == -1 {
            return Err(RuntimeError::EmptyStack);
        }
        let value = self.container.pop().expect("sp tracks container length");
        self.sp -= 1;
        Ok(value)
    }

    fn frame_index(&self, offset: isize) -> Result<usize, RuntimeError> {
        let idx = self.fp + offset;
        if idx < 0 || idx > self.sp {
            return Err(RuntimeError::OutOfBounds);
        }
        Ok(idx as usize)
    }

    pub fn fp_load(&self, offset: isize) -> Result<StackValue, RuntimeError> {
        let idx = self.frame_index(offset)?;
        Ok(self.container[idx])
    }

    pub fn fp_store(&mut self, offset: isize, value: StackValue) -> Result<(), RuntimeError> {
        let idx = self.frame_index(offset)?;
        self.container[idx] = value;
        Ok(())
    }

    pub fn load(&self, addr: Addr) -> Result<StackValue, RuntimeError> {
        match addr {
            Addr::Global(idx) => self.globals.get(idx).copied().ok_or(RuntimeError::OutOfBounds),
            Addr::Frame(off) => self.fp_load(off),
        }
    }

    pub fn store(&mut self, addr: Addr, value: StackValue) -> Result<(), RuntimeError> {
        match addr {
            Addr::Global(idx) => {
                if idx >= self.globals.len() {
                    return Err(RuntimeError::OutOfBounds);
                }
                self.globals[idx] = value;
                Ok(())
            }
            Addr::Frame(off) => self.fp_store(off, value),
        }
    }

    /// Grows the globals vector to fit `idx`, initializing fresh slots to
    /// `Int(0)`. Called once per global variable at compile time.
    pub fn reserve_global(&mut self, idx: usize) {
        if idx >= self.globals.len() {
            self.globals.resize(idx + 1, StackValue::Int(0));
        }
    }

    /// `ENTER n`: push the old `fp`, move `fp` to the current top, reserve
    /// `n` local slots.
    pub fn create_function_frame(&mut self, local_count: usize) {
        self.push(StackValue::Int(self.fp as i64));
        self.fp = self.sp;
        for _ in 0..local_count {
            self.push(StackValue::Int(0));
        }
    }

    /// `sp := fp; fp := pop()` — the resolved, correct frame-recovery rule —
    /// followed by dropping `nparams` argument slots the caller left below
    /// the restored frame.
    pub fn recover_function_frame(&mut self, nparams: i64) -> Result<(), RuntimeError> {
        self.sp = self.fp;
        self.container.truncate((self.sp + 1) as usize);
        let saved_fp = self.pop()?.as_int()?;
        self.fp = saved_fp as isize;
        for _ in 0..nparams {
            self.pop()?;
        }
        Ok(())
    }

    pub fn push_return(&mut self, addr: isize) {
        self.returns.push(addr);
    }

    pub fn pop_return(&mut self) -> Result<isize, RuntimeError> {
        self.returns.pop().ok_or(RuntimeError::EmptyStack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_balances() {
        let mut s = ExecStack::new();
        s.push(StackValue::Int(7));
        assert_eq!(s.len(), 1);
        assert_eq!(s.pop().unwrap().as_int().unwrap(), 7);
        assert!(s.is_empty());
    }

    #[test]
    fn pop_on_empty_errors() {
        let mut s = ExecStack::new();
        assert!(matches!(s.pop(), Err(RuntimeError::EmptyStack)));
    }

    #[test]
    fn frame_round_trips_through_enter_and_recover() {
        let mut s = ExecStack::new();
        s.push(StackValue::Int(42)); // pretend caller arg
        s.push_return(7); // pretend return address, pushed by CALL
        let sp_before_enter = s.sp;
        s.create_function_frame(2);
        assert_eq!(s.fp, sp_before_enter + 1);
        assert_eq!(s.fp_load(-1).unwrap().as_int().unwrap(), 42);
        s.fp_store(1, StackValue::Int(5)).unwrap();
        assert_eq!(s.fp_load(1).unwrap().as_int().unwrap(), 5);
        s.recover_function_frame(1).unwrap();
        assert_eq!(s.pop_return().unwrap(), 7);
        assert!(s.is_empty());
    }

    #[test]
    fn global_load_store_round_trips() {
        let mut s = ExecStack::new();
        s.reserve_global(0);
        s.store(Addr::Global(0), StackValue::Int(3)).unwrap();
        assert_eq!(s.load(Addr::Global(0)).unwrap().as_int().unwrap(), 3);
    }
}
