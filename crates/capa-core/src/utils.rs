//! 通用工具函数

use chrono::{Datelike, NaiveDate};

/// 生成指定年份的每日日期序列（1月1日至12月31日）
pub fn date_range_for_year(year: i32) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year start");
    let end = NaiveDate::from_ymd_opt(year, 12, 31).expect("valid year end");
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// 年份天数（闰年 366）
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// ISO 周序号
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// 数值格式化，空格作千位分隔符
pub fn format_number(value: f64, digits: usize) -> String {
    let formatted = format!("{:.*}", digits, value);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted, None),
    };
    let negative = int_part.starts_with('-');
    let digits_only: Vec<char> = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let mut grouped = String::new();
    for (i, c) in digits_only.iter().enumerate() {
        if i > 0 && (digits_only.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

/// 百分比格式化
pub fn format_percentage(value: f64, digits: usize) -> String {
    format!("{:.*}%", digits, value)
}
