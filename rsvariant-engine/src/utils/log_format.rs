use std::fmt::{self, Write};

// ======================== 核心：零堆分配字符串格式化 ========================
/// 空白字符折叠 + 截断，用于规则文本、角色名的日志预览
/// 遍历到最大长度立即终止，不创建中间String
#[inline(always)]
pub fn preview_compact<'a>(s: &'a str, max_len: usize) -> impl fmt::Display + 'a {
    struct CompactView<'a> {
        source: &'a str,
        max_length: usize,
    }

    impl<'a> fmt::Display for CompactView<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut char_count = 0;
            let mut last_was_whitespace = false;

            for ch in self.source.chars() {
                if char_count >= self.max_length {
                    f.write_str("…")?;
                    break;
                }

                if ch.is_whitespace() {
                    if !last_was_whitespace {
                        f.write_str(" ")?;
                        char_count += 1;
                        last_was_whitespace = true;
                    }
                } else {
                    f.write_char(ch)?;
                    char_count += 1;
                    last_was_whitespace = false;
                }
            }
            Ok(())
        }
    }

    CompactView {
        source: s,
        max_length: max_len,
    }
}

// ======================== 衍生：角色集合日志格式化 ========================
/// 角色集合日志格式化（基于preview_compact）
/// 格式：[role1, role2, ...] (total: N)
pub fn compress_role_set<'a, I>(roles: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    const MAX_COUNT: usize = 10; // 最多显示10个角色
    const MAX_ROLE_LEN: usize = 30; // 每个角色最多30字符

    let mut result = String::with_capacity(MAX_COUNT * (MAX_ROLE_LEN + 2) + 20);
    let mut total_count = 0;
    result.push('[');

    for role in roles {
        if total_count < MAX_COUNT {
            if total_count > 0 {
                result.push_str(", ");
            }
            // 写入String不会失败
            let _ = write!(result, "{}", preview_compact(role, MAX_ROLE_LEN));
        }
        total_count += 1;
    }

    if total_count == 0 {
        return "[empty]".to_string();
    }
    if total_count > MAX_COUNT {
        let _ = write!(result, "… (total: {})", total_count);
    }
    result.push(']');

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_compact_folds_whitespace_and_truncates() {
        assert_eq!(preview_compact("a   and\t b", 20).to_string(), "a and b");
        assert_eq!(preview_compact("abcdef", 3).to_string(), "abc…");
    }

    #[test]
    fn test_compress_role_set() {
        assert_eq!(compress_role_set(Vec::<&str>::new()), "[empty]");
        assert_eq!(compress_role_set(["a", "b"]), "[a, b]");

        let many: Vec<String> = (0..12).map(|i| format!("r{}", i)).collect();
        let text = compress_role_set(many.iter().map(String::as_str));
        assert!(text.starts_with("[r0, r1"));
        assert!(text.ends_with("… (total: 12)]"));
    }
}
