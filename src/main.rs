use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use emberjvm::class_loader::ClassLoader;
use emberjvm::frame::Frame;
use emberjvm::interpreter::Interpreter;
use emberjvm::method::Method;
use emberjvm::method_area::MethodArea;
use emberjvm::thread::Thread;

/// Loads a class from a classpath directory and runs one of its static, argument-less methods
/// to completion, printing whatever the exposed top frame's operand stack holds afterward.
///
/// Usage: `emberjvm <classpath-dir> <fully.qualified.ClassName> <methodName> <descriptor>`
fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 5 {
        eprintln!("usage: {} <classpath-dir> <class.Name> <methodName> <descriptor>", args[0]);
        return ExitCode::FAILURE;
    }
    let classpath = PathBuf::from(&args[1]);
    let class_name = &args[2];
    let method_name = &args[3];
    let descriptor = &args[4];

    let mut area = MethodArea::new();
    let mut loader = ClassLoader::new(None, vec![classpath], &mut area);

    let klass = match loader.load_class(class_name) {
        Ok(k) => k,
        Err(e) => {
            eprintln!("failed to load {class_name}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let method_ptr = match unsafe { &*klass }.find_method(method_name, descriptor) {
        Some(m) => m,
        None => {
            eprintln!("no such method: {class_name}.{method_name}{descriptor}");
            return ExitCode::FAILURE;
        }
    };

    let code_len = unsafe { &*method_ptr }.code.len();
    let sentinel = Method::sentinel(code_len);
    let mut thread = Thread::new();
    let mut sentinel_frame = Frame::new(&sentinel as *const Method);
    sentinel_frame.caller_pc = code_len;
    thread.push_frame(sentinel_frame);
    thread.push_frame(Frame::new(method_ptr));
    thread.set_pc(0);

    if let Err(e) = Interpreter::interpret(&mut thread, &mut loader) {
        eprintln!("{class_name}.{method_name}{descriptor} failed: {e}");
        return ExitCode::FAILURE;
    }

    match thread.current_frame().ok().and_then(|f| f.operand_stack.peek_slot().ok()) {
        Some(result) => println!("{class_name}.{method_name}{descriptor} -> {}", result.as_int()),
        None => println!("{class_name}.{method_name}{descriptor} -> (void)"),
    }
    ExitCode::SUCCESS
}
