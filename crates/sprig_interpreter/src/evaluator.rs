use std::{cell::RefCell, collections::HashMap, convert::TryFrom, io::Write, rc::Rc};

use log::{debug, trace};

use crate::{
    builtin::BuiltinRegistry,
    environment::Environment,
    error::RuntimeError,
    object::{Array, Function, Hash, Object},
};

use sprig_parser::{
    ast::{BlockStatement, Expression, HashLiteral, IdentifierLiteral, IfExpression, Program, Statement},
    token::Token,
};

type Env = Rc<RefCell<Environment>>;

/// Tunables for a single evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    /// How many user function calls may be nested before evaluation gives up with an error
    pub max_call_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            max_call_depth: 256,
        }
    }
}

/// Walks the AST against an environment, producing objects.
///
/// Runtime failures are returned as [`Object::Error`] values and bubble up
/// through every rule unchanged, the same way `return` values do.
pub struct Evaluator {
    builtins: BuiltinRegistry,
    output: Box<dyn Write>,
    config: EvaluatorConfig,
    depth: usize,
}

impl Evaluator {
    /// An evaluator whose `puts` writes to stdout
    pub fn new() -> Self {
        Self::with_output(std::io::stdout())
    }

    pub fn with_output<W: Write + 'static>(output: W) -> Self {
        Self::with_config(EvaluatorConfig::default(), output)
    }

    pub fn with_config<W: Write + 'static>(config: EvaluatorConfig, output: W) -> Self {
        Evaluator {
            builtins: BuiltinRegistry::new(),
            output: Box::new(output),
            config,
            depth: 0,
        }
    }

    pub fn eval(&mut self, prog: &Program, env: &Env) -> Rc<Object> {
        let mut result = null();

        for stmt in &prog.statements {
            let val = self.eval_statement(stmt, env);

            match val.as_ref() {
                // If a return value is found, immediately return and stop evaluating statements
                // Unwrap the return value into a final value so the program can use it
                Object::ReturnValue(inner_value) => return Rc::clone(inner_value),
                Object::Error(err) => {
                    debug!("evaluation failed: {}", err);
                    return val;
                }
                _ => result = val,
            }
        }

        result
    }

    /// Similar to eval (for programs) but doesn't unwrap return values
    pub fn eval_block(&mut self, block: &BlockStatement, env: &Env) -> Rc<Object> {
        let mut result = null();

        for stmt in &block.statements {
            let val = self.eval_statement(stmt, env);

            match val.as_ref() {
                // Don't unwrap the return value, we might be in a nested block which also needs to return
                Object::ReturnValue(_) | Object::Error(_) => return val,
                _ => result = val,
            }
        }

        result
    }

    pub fn eval_statement(&mut self, stmt: &Statement, env: &Env) -> Rc<Object> {
        match stmt {
            Statement::Expression { expression } => self.eval_expression(expression, env),
            Statement::Return { value } => {
                let obj = match value {
                    Some(value) => self.eval_expression(value, env),
                    None => null(),
                };

                // Errors and already-wrapped return values bubble up as they are
                if obj.is_signal() {
                    return obj;
                }

                Rc::new(Object::ReturnValue(obj))
            }
            Statement::Let { name, value } => {
                let obj = self.eval_expression(value, env);
                if obj.is_signal() {
                    return obj;
                }

                // Blocks share their enclosing frame, so this binds in the current function or global scope
                env.borrow_mut().set(name.name.clone(), obj);

                null()
            }
        }
    }

    pub fn eval_expression(&mut self, expr: &Expression, env: &Env) -> Rc<Object> {
        match expr {
            Expression::Integer(value) => Rc::new(Object::Integer(*value)),
            Expression::Float(value) => Rc::new(Object::Float(*value)),
            Expression::Boolean(value) => Rc::new(Object::Boolean(*value)),
            Expression::String(value) => Rc::new(Object::String(value.clone())),
            Expression::Identifier(identifier) => self.eval_identifier(identifier, env),

            Expression::Prefix(prefix) => {
                let right = self.eval_expression(&prefix.right, env);
                if right.is_signal() {
                    return right;
                }
                eval_prefix_expression(&prefix.operator, right)
            }
            Expression::Infix(infix) => {
                let left = self.eval_expression(&infix.left, env);
                if left.is_signal() {
                    return left;
                }
                let right = self.eval_expression(&infix.right, env);
                if right.is_signal() {
                    return right;
                }
                eval_infix_expression(&infix.operator, left, right)
            }

            Expression::If(if_expr) => self.eval_if_expression(if_expr, env),

            Expression::Array(arr) => match self.eval_expressions(&arr.elements, env) {
                Ok(elements) => Rc::new(Object::Array(Array { elements })),
                Err(err) => err,
            },
            Expression::Hash(hash) => self.eval_hash_literal(hash, env),
            Expression::Index(expr) => {
                let left = self.eval_expression(&expr.left, env);
                if left.is_signal() {
                    return left;
                }
                let index = self.eval_expression(&expr.index, env);
                if index.is_signal() {
                    return index;
                }
                eval_index_expression(left, index)
            }

            // Capture the defining scope by reference, not by copy
            Expression::Function(func) => Rc::new(Object::Function(Function {
                parameters: func.parameters.clone(),
                body: Rc::clone(&func.body),
                env: Rc::clone(env),
            })),
            Expression::Call(call) => {
                let func = self.eval_expression(&call.function, env);
                if func.is_signal() {
                    return func;
                }
                match self.eval_expressions(&call.arguments, env) {
                    Ok(args) => self.apply_function(func, args),
                    Err(err) => err,
                }
            }
        }
    }

    /// Evaluate expressions left to right, stopping at the first error or `return`.
    fn eval_expressions(
        &mut self,
        exprs: &[Expression],
        env: &Env,
    ) -> Result<Vec<Rc<Object>>, Rc<Object>> {
        let mut result = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let evaluated = self.eval_expression(expr, env);
            if evaluated.is_signal() {
                return Err(evaluated);
            }
            result.push(evaluated);
        }
        Ok(result)
    }

    fn eval_identifier(&self, identifier: &IdentifierLiteral, env: &Env) -> Rc<Object> {
        // Builtin names are reserved and always resolve to the builtin
        if let Some(builtin) = self.builtins.get(&identifier.name) {
            return builtin;
        }

        match env.borrow().get(&identifier.name) {
            Some(obj) => obj,
            None => error(RuntimeError::IdentifierNotFound(identifier.name.clone())),
        }
    }

    fn eval_if_expression(&mut self, if_expr: &IfExpression, env: &Env) -> Rc<Object> {
        let condition = self.eval_expression(&if_expr.condition, env);
        if condition.is_signal() {
            return condition;
        }

        if condition.is_truthy() {
            self.eval_block(&if_expr.consequence, env)
        } else if let Some(alternative) = &if_expr.alternative {
            self.eval_block(alternative, env)
        } else {
            null()
        }
    }

    fn eval_hash_literal(&mut self, hash: &HashLiteral, env: &Env) -> Rc<Object> {
        let mut pairs = HashMap::with_capacity(hash.pairs.len());

        for (key_expr, value_expr) in &hash.pairs {
            let key = self.eval_expression(key_expr, env);
            if key.is_signal() {
                return key;
            }

            let hash_key = match key.hash_key() {
                Some(hash_key) => hash_key,
                None => return error(RuntimeError::UnusableAsHashKey(key.typename())),
            };

            let value = self.eval_expression(value_expr, env);
            if value.is_signal() {
                return value;
            }

            pairs.insert(hash_key, value);
        }

        Rc::new(Object::Hash(Hash { pairs }))
    }

    fn apply_function(&mut self, func: Rc<Object>, args: Vec<Rc<Object>>) -> Rc<Object> {
        match func.as_ref() {
            Object::Function(func) => {
                // Check that number of args & params matches
                if args.len() != func.parameters.len() {
                    return error(RuntimeError::BadArity {
                        expected: func.parameters.len(),
                        got: args.len(),
                    });
                }

                if self.depth >= self.config.max_call_depth {
                    return error(RuntimeError::CallDepthExceeded(self.config.max_call_depth));
                }

                // Parameters live in a child of the scope the function was defined in, not the caller's
                let mut scoped_env = Environment::new_enclosed(Rc::clone(&func.env));
                for (ident, obj) in func.parameters.iter().zip(args.into_iter()) {
                    scoped_env.set(ident.name.clone(), obj);
                }
                trace!(
                    "calling {} at call depth {} (scope depth {})",
                    func,
                    self.depth + 1,
                    scoped_env.depth()
                );
                let scoped_env = Rc::new(RefCell::new(scoped_env));

                self.depth += 1;
                let result = self.eval_block(&func.body, &scoped_env);
                self.depth -= 1;

                unwrap_return_value(result)
            }
            // Builtins handle themselves
            Object::Builtin(builtin) => match builtin.apply(args, &mut *self.output) {
                Ok(obj) => obj,
                Err(err) => error(err),
            },
            _ => error(RuntimeError::NotAFunction(func.typename())),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn null() -> Rc<Object> {
    Rc::new(Object::Null)
}

fn error(err: RuntimeError) -> Rc<Object> {
    Rc::new(Object::Error(err))
}

fn unwrap_return_value(obj: Rc<Object>) -> Rc<Object> {
    match obj.as_ref() {
        Object::ReturnValue(inner) => Rc::clone(inner),
        _ => obj,
    }
}

fn eval_prefix_expression(operator: &Token, right: Rc<Object>) -> Rc<Object> {
    match (operator, right.as_ref()) {
        (Token::Bang, obj) => Rc::new(Object::Boolean(!obj.is_truthy())),
        (Token::Minus, Object::Integer(value)) => match value.checked_neg() {
            Some(negated) => Rc::new(Object::Integer(negated)),
            None => error(RuntimeError::IntegerOverflow),
        },
        (Token::Minus, Object::Float(value)) => Rc::new(Object::Float(-value)),
        (operator, obj) => error(RuntimeError::UnknownPrefixOperator {
            operator: operator.clone(),
            right: obj.typename(),
        }),
    }
}

fn eval_infix_expression(operator: &Token, left: Rc<Object>, right: Rc<Object>) -> Rc<Object> {
    match (left.as_ref(), right.as_ref()) {
        (Object::Integer(left_value), Object::Integer(right_value)) => {
            eval_integer_infix_expression(operator, *left_value, *right_value)
        }
        (Object::Float(left_value), Object::Float(right_value)) => {
            eval_float_infix_expression(operator, *left_value, *right_value)
        }
        (Object::String(left_value), Object::String(right_value)) => {
            eval_string_infix_expression(operator, left_value, right_value)
        }
        // Booleans and null only support (in)equality, and can be compared with each other
        (Object::Boolean(_) | Object::Null, Object::Boolean(_) | Object::Null) => match operator {
            Token::EqualEqual => Rc::new(Object::Boolean(left == right)),
            Token::BangEqual => Rc::new(Object::Boolean(left != right)),
            _ => unknown_infix_operator(operator, &left, &right),
        },
        (l, r) if l.typename() == r.typename() => unknown_infix_operator(operator, l, r),
        (l, r) => error(RuntimeError::TypeMismatch {
            left: l.typename(),
            operator: operator.clone(),
            right: r.typename(),
        }),
    }
}

fn unknown_infix_operator(operator: &Token, left: &Object, right: &Object) -> Rc<Object> {
    error(RuntimeError::UnknownInfixOperator {
        left: left.typename(),
        operator: operator.clone(),
        right: right.typename(),
    })
}

fn eval_integer_infix_expression(operator: &Token, left_value: i64, right_value: i64) -> Rc<Object> {
    let arithmetic = |result: Option<i64>| match result {
        Some(value) => Rc::new(Object::Integer(value)),
        None => error(RuntimeError::IntegerOverflow),
    };

    match operator {
        Token::Plus => arithmetic(left_value.checked_add(right_value)),
        Token::Minus => arithmetic(left_value.checked_sub(right_value)),
        Token::Star => arithmetic(left_value.checked_mul(right_value)),
        Token::Slash if right_value == 0 => error(RuntimeError::DivisionByZero),
        // Truncates toward zero
        Token::Slash => arithmetic(left_value.checked_div(right_value)),

        Token::LessThan => Rc::new(Object::Boolean(left_value < right_value)),
        Token::GreaterThan => Rc::new(Object::Boolean(left_value > right_value)),
        Token::EqualEqual => Rc::new(Object::Boolean(left_value == right_value)),
        Token::BangEqual => Rc::new(Object::Boolean(left_value != right_value)),

        operator => unknown_infix_operator(
            operator,
            &Object::Integer(left_value),
            &Object::Integer(right_value),
        ),
    }
}

fn eval_float_infix_expression(operator: &Token, left_value: f64, right_value: f64) -> Rc<Object> {
    match operator {
        Token::Plus => Rc::new(Object::Float(left_value + right_value)),
        Token::Minus => Rc::new(Object::Float(left_value - right_value)),
        Token::Star => Rc::new(Object::Float(left_value * right_value)),
        Token::Slash => Rc::new(Object::Float(left_value / right_value)),

        Token::LessThan => Rc::new(Object::Boolean(left_value < right_value)),
        Token::GreaterThan => Rc::new(Object::Boolean(left_value > right_value)),
        Token::EqualEqual => Rc::new(Object::Boolean(left_value == right_value)),
        Token::BangEqual => Rc::new(Object::Boolean(left_value != right_value)),

        operator => unknown_infix_operator(
            operator,
            &Object::Float(left_value),
            &Object::Float(right_value),
        ),
    }
}

fn eval_string_infix_expression(operator: &Token, left_value: &str, right_value: &str) -> Rc<Object> {
    match operator {
        Token::Plus => Rc::new(Object::String(left_value.to_owned() + right_value)),
        Token::EqualEqual => Rc::new(Object::Boolean(left_value == right_value)),
        Token::BangEqual => Rc::new(Object::Boolean(left_value != right_value)),

        operator => error(RuntimeError::UnknownInfixOperator {
            left: "STRING",
            operator: operator.clone(),
            right: "STRING",
        }),
    }
}

fn eval_index_expression(left: Rc<Object>, index: Rc<Object>) -> Rc<Object> {
    match (left.as_ref(), index.as_ref()) {
        (Object::Array(arr), Object::Integer(i)) => eval_array_index_expression(arr, *i),
        (Object::Array(_), index) => error(RuntimeError::InvalidIndexOperandType {
            left: "ARRAY",
            index: index.typename(),
        }),
        (Object::Hash(hash), key) => match key.hash_key() {
            Some(hash_key) => hash.pairs.get(&hash_key).map_or_else(null, Rc::clone),
            None => error(RuntimeError::UnusableAsHashKey(key.typename())),
        },
        (left, _) => error(RuntimeError::IndexNotSupported(left.typename())),
    }
}

fn eval_array_index_expression(arr: &Array, index: i64) -> Rc<Object> {
    // Out of range, negative included, gives null rather than an error
    usize::try_from(index)
        .ok()
        .and_then(|i| arr.elements.get(i))
        .map_or_else(null, Rc::clone)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io::Write, rc::Rc};

    use crate::{
        environment::Environment,
        error::RuntimeError,
        evaluator::{Evaluator, EvaluatorConfig},
        object::Object,
    };

    use sprig_parser::{parse, token::Token};

    /// An output sink the test can read back after the evaluator took ownership of it
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn eval_integer_expression() {
        let tests = vec![
            ("5", 5),
            ("10", 10),
            ("-5", -5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("5 * 2 + 10", 20),
            ("5 + 2 * 10", 25),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("7 / 2", 3),
            ("-7 / 2", -3),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_integer_object(evaluated, expected_value);
        }
    }

    #[test]
    fn eval_float_expression() {
        let tests = vec![
            ("5.5", 5.5),
            ("-5.5", -5.5),
            ("5.5 + 5.5 + 5.5 + 5.5 - 10.5", 11.5),
            ("2.5 * 2.5 * 2.5 * 2.5 * 2.5", 97.65625),
            ("5.5 * 2.5 + 10.5", 24.25),
            ("50.5 / 2.0 * 2.0 + 10.5", 61.0),
            ("2.5 * (5.5 + 10.5)", 40.0),
            ("0.1 + 0.2", 0.1 + 0.2),
            ("1.0 / 0.0", f64::INFINITY),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_float_object(evaluated, expected_value);
        }
    }

    #[test]
    fn eval_boolean_expression() {
        let tests = vec![
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 < 1", false),
            ("1 > 1", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("1 == 2", false),
            ("1 != 2", true),
            ("1.5 < 2.5", true),
            ("1.5 > 2.5", false),
            ("1.5 == 2.5", false),
            ("1.5 != 2.5", true),
            ("true == true", true),
            ("false == false", true),
            ("true == false", false),
            ("true != false", true),
            ("false != true", true),
            ("\"hello\" == \"hello\"", true),
            ("\"hello\" != \"world\"", true),
            ("(1 < 2) == true", true),
            ("(1 < 2) == false", false),
            ("(1 > 2) == true", false),
            ("(1 > 2) == false", true),
            ("0.1 + 0.2 == 0.3", false),
            ("if (false) { 1 } == if (false) { 2 }", true),
            ("if (false) { 1 } == false", false),
            ("true != if (false) { 1 }", true),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_boolean_object(evaluated, expected_value);
        }
    }

    #[test]
    fn eval_string_expression() {
        let tests = vec![
            ("\"hello world\"", "hello world"),
            ("\"hello\" + \" \" + \"world\"", "hello world"),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_string_object(evaluated, expected_value);
        }
    }

    #[test]
    fn eval_bang_operator() {
        let tests = vec![
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!0", false),
            ("!\"\"", false),
            ("!!true", true),
            ("!!false", false),
            ("!!5", true),
            ("!if (false) { 1 }", true),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_boolean_object(evaluated, expected_value);
        }
    }

    #[test]
    fn eval_if_else_expression() {
        let tests = vec![
            ("if (true) { 10 }", Object::Integer(10)),
            ("if (false) { 10 }", Object::Null),
            ("if (1) { 10 }", Object::Integer(10)),
            ("if (1 < 2) { 10 }", Object::Integer(10)),
            ("if (1 > 2) { 10 }", Object::Null),
            ("if (1 > 2) { 10 } else { 20 }", Object::Integer(20)),
            ("if (1 < 2) { 10 } else { 20 }", Object::Integer(10)),
            // Zero is truthy; only false and null are not
            ("if (0) { 1 } else { 2 }", Object::Integer(1)),
            ("if (false) { 1 } else { 2 }", Object::Integer(2)),
            ("if (if (false) { 1 }) { 1 } else { 2 }", Object::Integer(2)),
            ("if ([1][5]) { 1 } else { 2 }", Object::Integer(2)),
            ("if (true) { }", Object::Null),
        ];

        for (input, expected_obj) in tests {
            let evaluated = evaluate(input);

            match expected_obj {
                Object::Integer(expected_value) => test_integer_object(evaluated, expected_value),
                Object::Null => test_null_object(evaluated),
                _ => panic!("expected integer or null but got {}", expected_obj),
            }
        }
    }

    #[test]
    fn eval_return_statements() {
        let tests = vec![
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("return 2 * 5; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
            (
                "
                if (10 > 1) {
                  if (10 > 1) {
                    return 10;
                  }

                  return 1;
                }
                ",
                10,
            ),
            (
                "
                let f = function(x) {
                  if (x > 5) { return 1; }
                  return 2;
                };
                f(10) + f(1) * 10
                ",
                21,
            ),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_integer_object(evaluated, expected_value)
        }
    }

    #[test]
    fn return_inside_expression_leaves_function() {
        let tests = vec![
            ("let f = function() { let x = if (true) { return 5 }; 10 }; f()", 5),
            ("function() { 1 + if (true) { return 5 } }()", 5),
            ("function() { if (true) { return 5 } + 1 }()", 5),
            ("function() { -if (true) { return 5 } }()", 5),
            (
                "let g = function(x) { 99 }; let f = function() { g(if (true) { return 5 }) }; f()",
                5,
            ),
            ("function() { [1, if (true) { return 5 }, 3]; 10 }()", 5),
            ("function() { {\"a\": if (true) { return 5 }}; 10 }()", 5),
            ("function() { {if (true) { return 5 }: 1}; 10 }()", 5),
            ("function() { [1, 2][if (true) { return 5 }]; 10 }()", 5),
            ("function() { if (if (true) { return 5 }) { 1 } else { 2 } }()", 5),
            ("function() { return if (true) { return 5 }; 10 }()", 5),
            // The outer function keeps going once the inner call has returned
            ("let f = function() { if (true) { return 5 } }; f() + f()", 10),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_integer_object(evaluated, expected_value)
        }
    }

    #[test]
    fn return_inside_let_stops_program() {
        let buffer = SharedBuffer::default();
        let mut evaluator = Evaluator::with_output(buffer.clone());
        let env = Environment::new_shared();

        let (prog, errors) = parse("let x = if (true) { return 5 }; puts(\"after\"); 7");
        assert!(errors.is_empty());

        test_integer_object(evaluator.eval(&prog, &env), 5);
        assert_eq!(env.borrow().get("x"), None);
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn eval_bare_return() {
        test_null_object(evaluate("let f = function() { return; 5 }; f()"));
        test_null_object(evaluate("return;"));
    }

    #[test]
    fn eval_let_statements() {
        let tests = vec![
            ("let a = 5; a;", 5),
            ("let a = 5 * 5; a;", 25),
            ("let a = 5; let b = a; b;", 5),
            ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
            ("let a = 5; let a = a + 1; a", 6),
            ("if (true) { let inner = 3; }; inner", 3),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_integer_object(evaluated, expected_value)
        }
    }

    #[test]
    fn let_binds_in_given_environment() {
        let env = Environment::new_shared();
        let (prog, errors) = parse("let answer = 6 * 7;");
        assert!(errors.is_empty());

        let result = Evaluator::with_output(std::io::sink()).eval(&prog, &env);

        test_null_object(result);
        assert_eq!(
            env.borrow().get("answer"),
            Some(Rc::new(Object::Integer(42)))
        );
    }

    #[test]
    fn environment_persists_across_programs() {
        let env = Environment::new_shared();
        let mut evaluator = Evaluator::with_output(std::io::sink());

        let (first, _) = parse("let counter = function(x) { x + 1 };");
        let (second, _) = parse("counter(41)");

        evaluator.eval(&first, &env);
        test_integer_object(evaluator.eval(&second, &env), 42);
    }

    #[test]
    fn eval_array_literals() {
        let input = "[1, 2 * 2, 3 + 3]";
        let evaluated = evaluate(input);

        match evaluated.as_ref() {
            Object::Array(arr) => {
                if arr.elements.len() != 3 {
                    panic!(
                        "expected array object with 3 elements but got {} ({})",
                        arr.elements.len(),
                        arr
                    )
                }

                test_integer_object(Rc::clone(&arr.elements[0]), 1);
                test_integer_object(Rc::clone(&arr.elements[1]), 4);
                test_integer_object(Rc::clone(&arr.elements[2]), 6);
            }
            obj => panic!("expected array object but got {}", obj),
        }
    }

    #[test]
    fn eval_array_index_expression() {
        let tests = vec![
            ("[1, 2, 3][0]", Object::Integer(1)),
            ("[1, 2, 3][1]", Object::Integer(2)),
            ("[1, 2, 3][2]", Object::Integer(3)),
            ("let i = 0; [1][i];", Object::Integer(1)),
            ("[1, 2, 3][1 + 1];", Object::Integer(3)),
            ("let myArray = [1, 2, 3]; myArray[2];", Object::Integer(3)),
            (
                "let myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];",
                Object::Integer(6),
            ),
            (
                "let myArray = [1, 2, 3]; let i = myArray[0]; myArray[i]",
                Object::Integer(2),
            ),
            ("[1, 2, 3][3]", Object::Null),
            ("[1, 2, 3][5]", Object::Null),
            ("[1, 2, 3][-1]", Object::Null),
        ];

        for (input, expected_obj) in tests {
            let evaluated = evaluate(input);

            match expected_obj {
                Object::Integer(expected_value) => test_integer_object(evaluated, expected_value),
                Object::Null => test_null_object(evaluated),
                _ => panic!("expected integer or null but got {}", expected_obj),
            }
        }
    }

    #[test]
    fn eval_hash_literals() {
        let input = "
        let two = \"two\";
        {
            \"one\": 10 - 9,
            two: 1 + 1,
            \"thr\" + \"ee\": 6 / 2,
            4: 4,
            true: 5,
            false: 6
        }";

        let evaluated = evaluate(input);

        match evaluated.as_ref() {
            Object::Hash(hash) => {
                assert_eq!(hash.pairs.len(), 6);
            }
            obj => panic!("expected hash object but got {}", obj),
        }

        let tests = vec![
            ("one", 1),
            ("two", 2),
            ("three", 3),
        ];
        for (key, expected_value) in tests {
            let lookup = format!("{}[\"{}\"]", input, key);
            test_integer_object(evaluate(&lookup), expected_value);
        }
        test_integer_object(evaluate(&format!("{}[4]", input)), 4);
        test_integer_object(evaluate(&format!("{}[true]", input)), 5);
        test_integer_object(evaluate(&format!("{}[false]", input)), 6);
    }

    #[test]
    fn eval_hash_index_expression() {
        let tests = vec![
            ("{\"foo\": 5}[\"foo\"]", Object::Integer(5)),
            ("{\"foo\": 5}[\"bar\"]", Object::Null),
            ("let key = \"foo\"; {\"foo\": 5}[key]", Object::Integer(5)),
            ("{}[\"foo\"]", Object::Null),
            ("{5: 5}[5]", Object::Integer(5)),
            ("{true: 5}[true]", Object::Integer(5)),
            ("{\"a\": 1}[\"b\"]", Object::Null),
            ("{\"a\": 1}[true]", Object::Null),
            ("{\"a\": 1, \"a\": 2}[\"a\"]", Object::Integer(2)),
        ];

        for (input, expected_obj) in tests {
            let evaluated = evaluate(input);

            match expected_obj {
                Object::Integer(expected_value) => test_integer_object(evaluated, expected_value),
                Object::Null => test_null_object(evaluated),
                _ => panic!("expected integer or null but got {}", expected_obj),
            }
        }
    }

    #[test]
    fn float_literals_render_like_float_objects() {
        let tests = vec!["10000000000000000.0", "2.0", "0.5", "123456789.125"];

        for literal in tests {
            let value = evaluate(literal).inspect();
            let func = evaluate(&format!("function() {{ {} }}", literal)).inspect();

            assert_eq!(func, format!("fun(){{ {} }}", value));
        }
    }

    #[test]
    fn eval_function_expression() {
        let input = "function(x) { x + 2; }";
        let evaluated = evaluate(input);

        match evaluated.as_ref() {
            Object::Function(func) => {
                let params: Vec<&str> = func.parameters.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(params, vec!["x"]);
                assert_eq!(func.body.to_string(), "(x + 2)");
            }
            obj => panic!("expected function object but got {}", obj),
        }

        assert_eq!(evaluated.inspect(), "fun(x){ (x + 2) }");
    }

    #[test]
    fn function_inspect_is_stable_across_parses() {
        let input = "function(a, b) { let c = a * b; if (c > 10) { return c; } else { c - 1 } }";

        let first = evaluate(input).inspect();
        let second = evaluate(input).inspect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            "fun(a, b){ let c = (a * b); if (c > 10) { return c } else { (c - 1) } }"
        );
    }

    #[test]
    fn eval_call_expression() {
        let tests = vec![
            ("let identity = function(x) { x; }; identity(5);", 5),
            ("let identity = function(x) { return x; }; identity(5);", 5),
            ("let double = function(x) { x * 2; }; double(5);", 10),
            ("let add = function(x, y) { x + y; }; add(5, 5);", 10),
            ("let add = function(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("function(x) { x; }(5)", 5),
            (
                "
                let factorial = function(n) { if (n < 2) { 1 } else { n * factorial(n - 1) } };
                factorial(10);
                ",
                3628800,
            ),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_integer_object(evaluated, expected_value);
        }
    }

    #[test]
    fn eval_closures() {
        let tests = vec![
            (
                "
                let newAdder = function(x) { function(y) { x + y } };
                let addTwo = newAdder(2);
                addTwo(3);
                ",
                5,
            ),
            (
                "
                let adder = function(x) { function(y) { x + y } };
                let fiveAdder = adder(5);
                let tenAdder = adder(10);
                fiveAdder(3) + tenAdder(3);
                ",
                21,
            ),
            // The closure sees the frame it was defined in, not the caller's
            (
                "
                let x = 1;
                let getX = function() { x };
                let callWithX = function(x) { getX() };
                callWithX(100);
                ",
                1,
            ),
            // Rebinding in the captured frame after creation is visible through the closure
            (
                "
                let x = 1;
                let getX = function() { x };
                let x = 2;
                getX();
                ",
                2,
            ),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);
            test_integer_object(evaluated, expected_value);
        }
    }

    #[test]
    fn eval_builtin_functions() {
        let tests = vec![
            ("len(\"\")", Ok(Object::Integer(0))),
            ("len(\"four\")", Ok(Object::Integer(4))),
            ("len(\"hello world\")", Ok(Object::Integer(11))),
            (
                "len(1)",
                Err(RuntimeError::InvalidArgumentType {
                    builtin: "len",
                    got: "INTEGER",
                }),
            ),
            (
                "len(\"hello\", \"world\")",
                Err(RuntimeError::BadArity {
                    expected: 1,
                    got: 2,
                }),
            ),
            ("len([])", Ok(Object::Integer(0))),
            ("len([1, \"hello world\", []])", Ok(Object::Integer(3))),
            ("first([7, 8])", Ok(Object::Integer(7))),
            ("last([7, 8])", Ok(Object::Integer(8))),
            ("first([])", Ok(Object::Null)),
            ("len(rest([1, 2, 3]))", Ok(Object::Integer(2))),
            ("len(push([1], 2))", Ok(Object::Integer(2))),
            ("let a = [1]; let b = push(a, 2); len(a)", Ok(Object::Integer(1))),
            ("type(1)", Ok(Object::String("INTEGER".to_owned()))),
            ("type(type)", Ok(Object::String("BUILTIN".to_owned()))),
            ("type({})", Ok(Object::String("HASH".to_owned()))),
            // Builtin names cannot be shadowed
            ("let len = 5; type(len)", Ok(Object::String("BUILTIN".to_owned()))),
        ];

        for (input, expected_value) in tests {
            let evaluated = evaluate(input);

            match expected_value {
                Ok(Object::Integer(expected_value)) => {
                    test_integer_object(evaluated, expected_value)
                }
                Ok(Object::String(expected_value)) => {
                    test_string_object(evaluated, &expected_value)
                }
                Ok(Object::Null) => test_null_object(evaluated),
                Ok(_) => unimplemented!(),
                Err(expected_error) => test_error_object(evaluated, expected_error),
            }
        }
    }

    #[test]
    fn puts_writes_to_output_sink() {
        let buffer = SharedBuffer::default();
        let mut evaluator = Evaluator::with_output(buffer.clone());
        let env = Environment::new_shared();

        let (prog, errors) = parse(
            "puts(1, \"two\", [3, 4.5], function(x) { x }, if (false) { 1 }); puts()",
        );
        assert!(errors.is_empty());

        let result = evaluator.eval(&prog, &env);

        test_null_object(result);
        assert_eq!(
            buffer.contents(),
            "1\ntwo\n[3, 4.5]\nfun(x){ x }\nnull\n"
        );
    }

    #[test]
    fn error_handling() {
        let tests = vec![
            (
                "5 + true;",
                RuntimeError::TypeMismatch {
                    left: "INTEGER",
                    operator: Token::Plus,
                    right: "BOOLEAN",
                },
            ),
            (
                "5 + true; 5;",
                RuntimeError::TypeMismatch {
                    left: "INTEGER",
                    operator: Token::Plus,
                    right: "BOOLEAN",
                },
            ),
            (
                "1 + 1.5",
                RuntimeError::TypeMismatch {
                    left: "INTEGER",
                    operator: Token::Plus,
                    right: "FLOAT",
                },
            ),
            (
                "1 < 1.5",
                RuntimeError::TypeMismatch {
                    left: "INTEGER",
                    operator: Token::LessThan,
                    right: "FLOAT",
                },
            ),
            (
                "1 == true",
                RuntimeError::TypeMismatch {
                    left: "INTEGER",
                    operator: Token::EqualEqual,
                    right: "BOOLEAN",
                },
            ),
            (
                "-true",
                RuntimeError::UnknownPrefixOperator {
                    operator: Token::Minus,
                    right: "BOOLEAN",
                },
            ),
            (
                "true + false;",
                RuntimeError::UnknownInfixOperator {
                    left: "BOOLEAN",
                    operator: Token::Plus,
                    right: "BOOLEAN",
                },
            ),
            (
                "true < false;",
                RuntimeError::UnknownInfixOperator {
                    left: "BOOLEAN",
                    operator: Token::LessThan,
                    right: "BOOLEAN",
                },
            ),
            (
                "\"hello\" - \"world\";",
                RuntimeError::UnknownInfixOperator {
                    left: "STRING",
                    operator: Token::Minus,
                    right: "STRING",
                },
            ),
            (
                "[1] + [2]",
                RuntimeError::UnknownInfixOperator {
                    left: "ARRAY",
                    operator: Token::Plus,
                    right: "ARRAY",
                },
            ),
            (
                "5; true + false; 5",
                RuntimeError::UnknownInfixOperator {
                    left: "BOOLEAN",
                    operator: Token::Plus,
                    right: "BOOLEAN",
                },
            ),
            (
                "if (10 > 1) { true + false; }",
                RuntimeError::UnknownInfixOperator {
                    left: "BOOLEAN",
                    operator: Token::Plus,
                    right: "BOOLEAN",
                },
            ),
            (
                "
                if (10 > 1) {
                  if (10 > 1) {
                    return true + false;
                  }
                  return 1;
                }
                ",
                RuntimeError::UnknownInfixOperator {
                    left: "BOOLEAN",
                    operator: Token::Plus,
                    right: "BOOLEAN",
                },
            ),
            ("foobar", RuntimeError::IdentifierNotFound("foobar".into())),
            ("10 / 0", RuntimeError::DivisionByZero),
            ("9223372036854775807 + 1", RuntimeError::IntegerOverflow),
            ("{\"name\": \"Sprig\"}[function(x) { x }];", RuntimeError::UnusableAsHashKey("FUNCTION")),
            ("{[1]: 2}", RuntimeError::UnusableAsHashKey("ARRAY")),
            ("{\"a\": 1}[[1]]", RuntimeError::UnusableAsHashKey("ARRAY")),
            (
                "[1, 2][true]",
                RuntimeError::InvalidIndexOperandType {
                    left: "ARRAY",
                    index: "BOOLEAN",
                },
            ),
            ("1[0]", RuntimeError::IndexNotSupported("INTEGER")),
            ("5(1)", RuntimeError::NotAFunction("INTEGER")),
            (
                "function() { 1 }(1)",
                RuntimeError::BadArity {
                    expected: 0,
                    got: 1,
                },
            ),
            (
                "function(a, b) { a }(1)",
                RuntimeError::BadArity {
                    expected: 2,
                    got: 1,
                },
            ),
        ];

        for (input, expected_error) in tests {
            let evaluated = evaluate(input);
            test_error_object(evaluated, expected_error)
        }
    }

    #[test]
    fn errors_short_circuit() {
        let mismatch = RuntimeError::TypeMismatch {
            left: "INTEGER",
            operator: Token::Plus,
            right: "BOOLEAN",
        };

        let tests = vec![
            "let f = function(x) { x }; f(5 + true)",
            "let f = function() { let y = 5 + true; 10 }; f()",
            "if (5 + true) { 1 } else { 2 }",
            "[1, 5 + true, 3]",
            "{\"a\": 5 + true}",
            "-(5 + true)",
            "len(5 + true)",
            "let g = function(x) { function(y) { x + y } }; g(5)(true)",
            "let a = 5 + true; 10",
        ];

        for input in tests {
            let evaluated = evaluate(input);
            test_error_object(evaluated, mismatch.clone())
        }
    }

    #[test]
    fn failing_argument_stops_later_arguments() {
        let buffer = SharedBuffer::default();
        let mut evaluator = Evaluator::with_output(buffer.clone());
        let env = Environment::new_shared();

        let (prog, _) = parse("puts(puts(\"first\"), missing, puts(\"never\"))");
        let result = evaluator.eval(&prog, &env);

        test_error_object(result, RuntimeError::IdentifierNotFound("missing".into()));
        assert_eq!(buffer.contents(), "first\n");
    }

    #[test]
    fn call_depth_is_bounded() {
        let config = EvaluatorConfig { max_call_depth: 20 };
        let mut evaluator = Evaluator::with_config(config, std::io::sink());
        let env = Environment::new_shared();

        let (prog, _) = parse("let loop = function(n) { loop(n + 1) }; loop(0)");
        test_error_object(evaluator.eval(&prog, &env), RuntimeError::CallDepthExceeded(20));

        // The depth counter unwinds, so later calls still work
        let (prog, _) = parse("let count = function(n) { if (n > 0) { count(n - 1) } else { 0 } }; count(10)");
        test_integer_object(evaluator.eval(&prog, &env), 0);
    }

    #[test]
    fn error_inspect() {
        let evaluated = evaluate("5 + true");
        assert_eq!(evaluated.inspect(), "ERROR: type mismatch: INTEGER + BOOLEAN");
    }

    fn evaluate(input: &str) -> Rc<Object> {
        let (prog, errors) = parse(input);

        if !errors.is_empty() {
            println!("parser had {} errors", errors.len());
            for error in errors {
                println!("parser error: {}", error);
            }
            panic!("parser errors")
        }

        let env = Environment::new_shared();
        Evaluator::with_output(std::io::sink()).eval(&prog, &env)
    }

    fn test_integer_object(obj: Rc<Object>, expected_value: i64) {
        match *obj {
            Object::Integer(value) => {
                if value != expected_value {
                    panic!(
                        "expected integer object with value {} but got {:?}",
                        expected_value, obj
                    )
                }
            }
            _ => panic!("expected integer object but got {:?}", obj),
        }
    }

    fn test_float_object(obj: Rc<Object>, expected_value: f64) {
        match *obj {
            Object::Float(value) => {
                if value != expected_value {
                    panic!(
                        "expected float object with value {} but got {:?}",
                        expected_value, obj
                    )
                }
            }
            _ => panic!("expected float object but got {:?}", obj),
        }
    }

    fn test_boolean_object(obj: Rc<Object>, expected_value: bool) {
        match *obj {
            Object::Boolean(value) => {
                if value != expected_value {
                    panic!(
                        "expected boolean object with value {} but got {:?}",
                        expected_value, obj
                    )
                }
            }
            _ => panic!("expected boolean object but got {:?}", obj),
        }
    }

    fn test_string_object(obj: Rc<Object>, expected_value: &str) {
        match obj.as_ref() {
            Object::String(value) => {
                if value != expected_value {
                    panic!(
                        "expected string object with value {} but got {:?}",
                        expected_value, obj
                    )
                }
            }
            _ => panic!("expected string object but got {:?}", obj),
        }
    }

    fn test_null_object(obj: Rc<Object>) {
        match *obj {
            Object::Null => {}
            _ => panic!("expected null object but got {:?}", obj),
        }
    }

    fn test_error_object(obj: Rc<Object>, expected_error: RuntimeError) {
        match obj.as_ref() {
            Object::Error(err) => {
                if *err != expected_error {
                    panic!(
                        "expected error to be \"{:?}\" but got \"{:?}\"",
                        expected_error, err
                    )
                }
            }
            _ => panic!("expected error object but got {:?}", obj),
        }
    }
}
