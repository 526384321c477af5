//! 交互式读取 API 密钥（明文回显）。

use std::io::{self, BufRead, Write};

/// 打印提示并读取一行输入，返回去除首尾空白后的密钥。
pub fn read_api_key<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<String> {
    writeln!(output, "An API key is required to upload the site.")?;
    writeln!(output, "   (find it under https://neocities.org/settings -> 'API Key')")?;
    write!(output, "🔑 Paste your API key: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
