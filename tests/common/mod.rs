use assert_cmd::Command;

pub fn codepad_bin() -> Command {
    #[allow(deprecated)]
    {
        Command::cargo_bin("codepad").expect("codepad test binary should build")
    }
}
