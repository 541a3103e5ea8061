use std::fs;

use atomc_lex::{Lexer, Token, TokenKind};
use atomc_par::parse_program;
use atomc_util::{Handler, Level, Span};
use atomc_vm::Vm;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::CompileError;

/// The single owning value for one compile-and-run: the resolved config,
/// and a diagnostics `Handler` recording whatever the run failed on. The
/// pipeline itself is still first-error-aborts (each phase returns on its
/// first `Err`), so `diagnostics` never accumulates more than one entry in
/// practice — but it gives a caller embedding this crate (rather than the
/// `atomc` binary) one place to inspect the failure instead of pattern
/// matching on `CompileError` directly.
pub struct Session {
    config: Config,
    diagnostics: Handler,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            diagnostics: Handler::new(),
        }
    }

    pub fn diagnostics(&self) -> &Handler {
        &self.diagnostics
    }

    #[instrument(skip(self), fields(path = %self.config.path.display()))]
    pub fn run(&mut self) -> Result<(), CompileError> {
        let result = self.run_pipeline();
        if let Err(ref err) = result {
            self.record(err);
        }
        result
    }

    fn run_pipeline(&self) -> Result<(), CompileError> {
        let source = self.read_source()?;
        let tokens = self.lex(&source)?;
        let program = self.parse(tokens)?;
        self.execute(program)
    }

    fn record(&mut self, err: &CompileError) {
        let span = err.line().map(|line| Span::new(0, 0, line));
        self.diagnostics.report(Level::Error, err.to_string(), span);
    }

    fn read_source(&self) -> Result<String, CompileError> {
        info!("reading source");
        fs::read_to_string(&self.config.path).map_err(|source| CompileError::Io {
            path: self.config.path.display().to_string(),
            source,
        })
    }

    #[instrument(skip_all)]
    fn lex(&self, source: &str) -> Result<Vec<Token>, CompileError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let at_end = token.kind == TokenKind::End;
            tokens.push(token);
            if at_end {
                break;
            }
        }
        debug!(count = tokens.len(), "lexed tokens");
        Ok(tokens)
    }

    #[instrument(skip_all)]
    fn parse(&self, tokens: Vec<Token>) -> Result<atomc_par::CompiledProgram, CompileError> {
        let program = parse_program(tokens)?;
        debug!(
            instructions = program.code.len(),
            entry = program.entry,
            globals = program.global_slots,
            "parsed and analyzed"
        );
        Ok(program)
    }

    /// `program.code` opens with a fixed `CALL main; HALT` prologue (emitted
    /// by `Parser::new`, patched once `main`'s address is known), so the
    /// VM's normal `ip = 0` start is already the program's entry point.
    #[instrument(skip_all)]
    fn execute(&self, program: atomc_par::CompiledProgram) -> Result<(), CompileError> {
        let mut vm = Vm::new(program.code);
        if program.global_slots > 0 {
            vm.stack_mut().reserve_global(program.global_slots - 1);
        }
        vm.run()?;
        info!("execution finished");
        Ok(())
    }
}
