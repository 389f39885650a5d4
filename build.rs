use vergen::EmitBuilder;

fn main() {
    // 生成构建信息，git 不可用时 vergen 会输出默认值而不是失败
    if let Err(e) = EmitBuilder::builder()
        .build_timestamp()
        .git_sha(true)
        .emit()
    {
        println!("cargo:warning=无法生成构建信息: {}", e);
    }
}
