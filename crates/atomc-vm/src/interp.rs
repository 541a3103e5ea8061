use crate::externals::ExternalRegistry;
use crate::opcode::{Arg, Instruction, Opcode};
use crate::stack::{Addr, ExecStack, StackValue};
use atomc_util::RuntimeError;

/// The dispatch loop: `ip` runs over `[0, code.len())` until `HALT` sets it
/// to -1. Every handler below mutates `ip` explicitly — control flow
/// opcodes assign it, everything else increments by one.
pub struct Vm {
    code: Vec<Instruction>,
    stack: ExecStack,
    externals: ExternalRegistry,
    ip: isize,
}

impl Vm {
    pub fn new(code: Vec<Instruction>) -> Self {
        Self {
            code,
            stack: ExecStack::new(),
            externals: ExternalRegistry::new(),
            ip: 0,
        }
    }

    pub fn externals_mut(&mut self) -> &mut ExternalRegistry {
        &mut self.externals
    }

    pub fn stack_mut(&mut self) -> &mut ExecStack {
        &mut self.stack
    }

    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while self.ip != -1 {
            let idx = self.ip as usize;
            let instr = self.code.get(idx).ok_or(RuntimeError::InvalidIp)?.clone();
            self.step(instr)?;
        }
        Ok(())
    }

    fn int_arg(arg: &Arg) -> i64 {
        match arg {
            Arg::Int(v) => *v,
            _ => panic!("opcode expects an int argument"),
        }
    }

    fn float_arg(arg: &Arg) -> f64 {
        match arg {
            Arg::Float(v) => *v,
            _ => panic!("opcode expects a float argument"),
        }
    }

    fn offset_arg(arg: &Arg) -> isize {
        match arg {
            Arg::Offset(v) => *v,
            _ => panic!("opcode expects an offset argument"),
        }
    }

    fn addr_arg(arg: &Arg) -> usize {
        match arg {
            Arg::Addr(v) => *v,
            _ => panic!("opcode expects an address argument"),
        }
    }

    fn name_arg(arg: &Arg) -> &str {
        match arg {
            Arg::Name(v) => v,
            _ => panic!("opcode expects a name argument"),
        }
    }

    fn step(&mut self, instr: Instruction) -> Result<(), RuntimeError> {
        match instr.op {
            Opcode::Halt => {
                self.ip = -1;
            }
            Opcode::Call => {
                let target = Self::addr_arg(&instr.arg);
                self.stack.push_return(self.ip + 1);
                self.ip = target as isize;
            }
            Opcode::CallExt => {
                let name = Self::name_arg(&instr.arg).to_owned();
                self.externals.call(&name, &mut self.stack)?;
                self.ip += 1;
            }
            Opcode::Enter => {
                let n = Self::int_arg(&instr.arg);
                self.stack.create_function_frame(n as usize);
                self.ip += 1;
            }
            Opcode::Ret => {
                let nparams = Self::int_arg(&instr.arg);
                let ret_val = self.stack.pop()?;
                self.stack.recover_function_frame(nparams)?;
                let ret_addr = self.stack.pop_return()?;
                self.stack.push(ret_val);
                self.ip = ret_addr;
            }
            Opcode::RetVoid => {
                let nparams = Self::int_arg(&instr.arg);
                self.stack.recover_function_frame(nparams)?;
                let ret_addr = self.stack.pop_return()?;
                self.ip = ret_addr;
            }
            Opcode::PushI => {
                self.stack.push(StackValue::Int(Self::int_arg(&instr.arg)));
                self.ip += 1;
            }
            Opcode::PushF => {
                self.stack.push(StackValue::Float(Self::float_arg(&instr.arg)));
                self.ip += 1;
            }
            Opcode::FpAddrI | Opcode::FpAddrF => {
                let off = Self::offset_arg(&instr.arg);
                self.stack.push(StackValue::Addr(Addr::Frame(off)));
                self.ip += 1;
            }
            Opcode::FpLoad => {
                let off = Self::offset_arg(&instr.arg);
                let v = self.stack.fp_load(off)?;
                self.stack.push(v);
                self.ip += 1;
            }
            Opcode::FpStore => {
                let off = Self::offset_arg(&instr.arg);
                let v = self.stack.pop()?;
                self.stack.fp_store(off, v)?;
                self.ip += 1;
            }
            Opcode::LoadI | Opcode::LoadF => {
                let addr = self.stack.pop()?.as_addr()?;
                let v = self.stack.load(addr)?;
                self.stack.push(v);
                self.ip += 1;
            }
            Opcode::StoreI | Opcode::StoreF => {
                let value = self.stack.pop()?;
                let addr = self.stack.pop()?.as_addr()?;
                self.stack.store(addr, value)?;
                self.stack.push(value);
                self.ip += 1;
            }
            Opcode::Addr => {
                let idx = Self::int_arg(&instr.arg) as usize;
                self.stack.push(StackValue::Addr(Addr::Global(idx)));
                self.ip += 1;
            }
            Opcode::Offset => {
                let stride = Self::int_arg(&instr.arg);
                let idx = self.stack.pop()?.as_int()?;
                let addr = self.stack.pop()?.as_addr()?;
                self.stack.push(StackValue::Addr(addr.shift(idx * stride)));
                self.ip += 1;
            }
            Opcode::Drop => {
                self.stack.pop()?;
                self.ip += 1;
            }
            Opcode::ConvIF => {
                let v = self.stack.pop()?.as_int()?;
                self.stack.push(StackValue::Float(v as f64));
                self.ip += 1;
            }
            Opcode::ConvFI => {
                let v = self.stack.pop()?.as_float()?;
                self.stack.push(StackValue::Int(v as i64));
                self.ip += 1;
            }
            Opcode::Jmp => {
                self.ip = Self::addr_arg(&instr.arg) as isize;
            }
            Opcode::Jf => {
                let cond = self.stack.pop()?.as_int()?;
                self.ip = if cond == 0 {
                    Self::addr_arg(&instr.arg) as isize
                } else {
                    self.ip + 1
                };
            }
            Opcode::Jt => {
                let cond = self.stack.pop()?.as_int()?;
                self.ip = if cond != 0 {
                    Self::addr_arg(&instr.arg) as isize
                } else {
                    self.ip + 1
                };
            }
            Opcode::AddI => self.binop_i(|a, b| a + b)?,
            Opcode::SubI => self.binop_i(|a, b| a - b)?,
            Opcode::MulI => self.binop_i(|a, b| a * b)?,
            Opcode::DivI => self.binop_i(|a, b| a / b)?,
            Opcode::AddF => self.binop_f(|a, b| a + b)?,
            Opcode::SubF => self.binop_f(|a, b| a - b)?,
            Opcode::MulF => self.binop_f(|a, b| a * b)?,
            Opcode::DivF => self.binop_f(|a, b| a / b)?,
            Opcode::LessI => {
                let b = self.stack.pop()?.as_int()?;
                let a = self.stack.pop()?.as_int()?;
                self.stack.push(StackValue::Int((a < b) as i64));
                self.ip += 1;
            }
            Opcode::LessF => {
                let b = self.stack.pop()?.as_float()?;
                let a = self.stack.pop()?.as_float()?;
                self.stack.push(StackValue::Int((a < b) as i64));
                self.ip += 1;
            }
        }
        Ok(())
    }

    fn binop_i(&mut self, f: impl Fn(i64, i64) -> i64) -> Result<(), RuntimeError> {
        let b = self.stack.pop()?.as_int()?;
        let a = self.stack.pop()?.as_int()?;
        self.stack.push(StackValue::Int(f(a, b)));
        self.ip += 1;
        Ok(())
    }

    fn binop_f(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.stack.pop()?.as_float()?;
        let a = self.stack.pop()?.as_float()?;
        self.stack.push(StackValue::Float(f(a, b)));
        self.ip += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_add_and_halts() {
        let code = vec![
            Instruction::new(Opcode::PushI, Arg::Int(2)),
            Instruction::new(Opcode::PushI, Arg::Int(3)),
            Instruction::new(Opcode::AddI, Arg::None),
            Instruction::new(Opcode::Halt, Arg::None),
        ];
        let mut vm = Vm::new(code);
        vm.run().unwrap();
        assert_eq!(vm.stack_mut().pop().unwrap().as_int().unwrap(), 5);
    }

    #[test]
    fn jf_consumes_condition_once() {
        let code = vec![
            Instruction::new(Opcode::PushI, Arg::Int(0)),
            Instruction::new(Opcode::Jf, Arg::Addr(3)),
            Instruction::new(Opcode::PushI, Arg::Int(999)),
            Instruction::new(Opcode::Halt, Arg::None),
        ];
        let mut vm = Vm::new(code);
        vm.run().unwrap();
        assert!(vm.stack_mut().is_empty());
    }

    #[test]
    fn call_ret_round_trips_ip_and_frame() {
        // main: PUSH_I 1 (one arg for f); CALL f; HALT
        // f:    ENTER 0; FP_LOAD -1 (reads the caller's arg); DROP; RET_VOID 1
        let code = vec![
            Instruction::new(Opcode::PushI, Arg::Int(1)),    // 0
            Instruction::new(Opcode::Call, Arg::Addr(3)),    // 1
            Instruction::new(Opcode::Halt, Arg::None),       // 2
            Instruction::new(Opcode::Enter, Arg::Int(0)),    // 3
            Instruction::new(Opcode::FpLoad, Arg::Offset(-1)), // 4
            Instruction::new(Opcode::Drop, Arg::None),       // 5
            Instruction::new(Opcode::RetVoid, Arg::Int(1)),  // 6
        ];
        let mut vm = Vm::new(code);
        vm.run().unwrap();
        assert!(vm.stack_mut().is_empty());
    }
}
