//! User-facing replies (Persian). All values are Telegram HTML.

use crate::formatting::escape_html;

// Gate
pub const NOT_OUR_GROUP: &str = "این گروه، گروه تایپولوژی نیست.";
pub const REPLY_REQUIRED: &str = "لطفاً این دستور را در پاسخ به پیام کاربر مورد نظر استفاده کنید.";
pub const ADMINS_ONLY: &str = "این دستور فقط برای ادمین‌ها قابل دسترسی است.";

// Ban / unban
pub const BAN_SELF: &str = "من نمی‌توانم خودم را بن کنم.";
pub const BAN_ADMIN: &str = "من نمی‌توانم یک ادمین را بن کنم.";
pub const BAN_FAILED: &str = "من نمی‌توانم کاربر را بن کنم. لطفاً از دسترسی من اطمینان حاصل کنید.";
pub const NO_REASON: &str = "بدون دلیل";
pub const UNBAN_SELF: &str = "من نمی‌توانم خودم را آنبن کنم.";
pub const UNBAN_ADMIN: &str = "من نمی‌توانم یک ادمین را آنبن کنم.";
pub const UNBAN_FAILED: &str =
    "من نمی‌توانم کاربر را آنبن کنم. لطفاً از دسترسی من اطمینان حاصل کنید.";

// Mute / unmute
pub const MUTE_SELF: &str = "من نمی‌توانم خودم را میوت کنم.";
pub const MUTE_ADMIN: &str = "من نمی‌توانم یک ادمین را میوت کنم.";
pub const MUTE_FAILED: &str =
    "خطایی در میوت کردن کاربر رخ داد. لطفاً از دسترسی من اطمینان حاصل کنید.";
pub const MUTE_BAD_DURATION: &str = "لطفاً یک عدد صحیح برای مدت میوت وارد کنید (به دقیقه).";
pub const UNMUTE_SELF: &str = "من نمی‌توانم خودم را آنمیوت کنم.";
pub const UNMUTE_ADMIN: &str = "من نمی‌توانم یک ادمین را آنمیوت کنم.";
pub const UNMUTE_FAILED: &str =
    "خطایی در آنمیوت کردن کاربر رخ داد. لطفاً از دسترسی من اطمینان حاصل کنید.";

// Messages
pub const DELETE_FAILED: &str = "خطایی در حذف پیام رخ داد.";
pub const PIN_FAILED: &str = "خطایی در سنجاق کردن پیام رخ داد.";
pub const UNPIN_FAILED: &str = "خطایی در از سنجاق خارج کردن پیام رخ داد.";
pub const UNPIN_ALL_FAILED: &str = "خطایی در از سنجاق خارج کردن پیام‌ها رخ داد.";

// Report / admins
pub const REPORT_ADMIN: &str = "نمی‌توانید یک ادمین را گزارش دهید.";
pub const REPORT_SELF: &str = "نمی‌توانید خودتان را گزارش دهید.";
pub const REPORT_SENT: &str = "گزارش شما ارسال شد.";
pub const REPORT_FAILED: &str = "خطایی در گزارش کاربر رخ داد.";
pub const ADMINS_FAILED: &str = "خطایی در نمایش ادمین‌ها رخ داد.";

// Video relay
pub const VIDEO_DOWNLOADING: &str = "در حال دانلود ویدیو...";
pub const VIDEO_TOO_LARGE: &str =
    "ویدیو باید کمتر از 50 مگابایت باشد. لطفا ویدیو کوچکتری انتخاب کنید.";
pub const VIDEO_FAILED: &str = "ویدیو دانلود نشد. لطفا دوباره تلاش کنید.";
pub const VIDEO_SEND_FAILED: &str = "خطا در ارسال ویدیو. لطفا دوباره تلاش کنید.";
pub const BUSY: &str = "درخواست قبلی شما هنوز در حال انجام است.";

// Demo clips
pub const DEMO_REPLY_REQUIRED: &str =
    "لطفاً این دستور را با ریپلای به یک فایل صوتی ارسال کنید. مثال: /from 10";
pub const DEMO_BAD_START: &str = "لطفاً یک عدد صحیح برای زمان شروع وارد کنید. مثال: /from 10";
pub const DEMO_CREATING: &str = "در حال ایجاد فایل صوتی...";
pub const DEMO_FAILED: &str = "خطایی در ایجاد دمو رخ داد. لطفا دوباره تلاش کنید.";

// General
pub const START: &str = "در حال اجرا هستم. برای راهنمایی بیشتر دستور /help را وارد کنید.";
pub const HELP_NOT_OUR_GROUP: &str = "غیر از اون، این گروه، گروه تایپولوژی نیست.";
pub const CHAT_EMPTY: &str = "لطفاً یک پیام برای چت وارد کنید.";
pub const CHAT_UNAVAILABLE: &str = "چت در حال حاضر در دسترس نیست.";
pub const CHAT_FAILED: &str = "خطایی در پاسخ به پیام شما رخ داد.";
pub const BOT_JOINED: &str = "خوش آمدم!";

pub fn banned(target: &str, admin: &str, reason: &str) -> String {
    format!(
        "کاربر {target} توسط ادمین {admin} بن شد.\nدلیل: {}",
        escape_html(reason)
    )
}

pub fn unbanned(target: &str, admin: &str) -> String {
    format!("کاربر {target} توسط ادمین {admin} آنبن شد.")
}

pub fn muted(target: &str, admin: &str, minutes: Option<u32>) -> String {
    let duration = match minutes {
        Some(m) => format!(" به مدت {m} دقیقه"),
        None => " به صورت نامحدود".to_string(),
    };
    format!("کاربر {target} توسط ادمین {admin}{duration} میوت شد.")
}

pub fn unmuted(target: &str, admin: &str) -> String {
    format!("کاربر {target} توسط ادمین {admin} آنمیوت شد.")
}

pub fn deleted(target: &str, admin: &str) -> String {
    format!("پیام کاربر {target} توسط ادمین {admin} حذف شد.")
}

pub fn pinned(target: &str, admin: &str) -> String {
    format!("پیام کاربر {target} توسط ادمین {admin} سنجاق شد.")
}

pub fn unpinned(admin: &str) -> String {
    format!("پیام توسط ادمین {admin} از سنجاق خارج شد.")
}

pub fn unpinned_all(admin: &str) -> String {
    format!("همه پیام‌ها توسط ادمین {admin} از سنجاق خارج شدند.")
}

/// `mentions` are pre-rendered (zero-width) admin mentions.
pub fn report_broadcast(mentions: &str, reported: &str) -> String {
    format!("{mentions}\nکاربر {reported} گزارش شد.")
}

/// `lines` are `name - role` entries, already escaped.
pub fn admin_list(lines: &[String]) -> String {
    format!("ادمین‌های در گروه:\n{}", lines.join("\n"))
}

pub fn wait_seconds(seconds: u64) -> String {
    format!("لطفاً {seconds} ثانیه صبر کنید.")
}

pub fn video_caption(title: &str, url: &str, bot_username: &str) -> String {
    format!(
        "این هم ویدیوی شما.\n\n{}\n\n{}\n\n@{}",
        escape_html(title),
        escape_html(url),
        escape_html(bot_username)
    )
}

pub fn demo_start_too_late(duration: u32) -> String {
    format!("زمان شروع نمی‌تواند بیشتر از مدت زمان فایل ({duration}s) باشد.")
}

pub fn demo_caption(title: &str, start: u32) -> String {
    format!("دموی {} (from {start}s)", escape_html(title))
}

pub fn help(full_name: &str) -> String {
    format!(
        "درود، {}\n\n\
من Typology Bot v2 هستم.\n\n\
برای استفاده، من را به گروه خود با دسترسی‌های معمولی ادمین اضافه کنید، \
در غیر این صورت، نمی‌توانم کار کنم.\n\n\n\
دستورات برای ادمین‌ها:\n\n\
<code>/ban</code> (دلیل) - بن کردن کاربر و حذف او از گروه\n\n\
<code>/unban</code> - آنبن کردن\n\n\
<code>/mute</code> - میوت کردن\n\n\
<code>/mute 10</code> - میوت کردن کاربر به مدت مشخص (دقیقه)\n\n\
<code>/unmute</code> - آنمیوت کردن\n\n\
<code>/del</code> - حذف پیام\n\n\
<code>/report</code> - گزارش به ادمین‌ها\n\n\
<code>/pin</code> - سنجاق کردن پیام\n\n\
<code>/unpin</code> - از سنجاق خارج کردن\n\n\
<code>/unpin_all</code> - از سنجاق خارج کردن همه پیام‌ها\n\n\
توجه: دستورات بالا به جز دو مورد آخر باید با پاسخ به پیام کاربر ارسال شوند!\n\n\
<code>/admins</code> - نمایش همه ادمین‌ها\n\n\n\
<code>/chat</code> - چت با بات\n\n\
<code>/from 10</code> - ساخت دمو از ثانیه 10 (با ریپلای به فایل صوتی)\n\n\
<code>/info</code> - اطلاعات شما\n\n\
<code>/chatinfo</code> - اطلاعات گروه\n\n\
با فرستادن لینک یوتیوب، به صورت خودکار دانلود می شود.\n\n\n\
<i>توسعه داده شده توسط ایماگو</i>",
        escape_html(full_name)
    )
}

pub fn user_info(
    full_name: &str,
    id: i64,
    language: Option<&str>,
    username: Option<&str>,
) -> String {
    format!(
        "نام: {}\nآیدی: {id}\nزبان: {}\nنام کاربری: {}",
        escape_html(full_name),
        escape_html(language.unwrap_or("-")),
        escape_html(username.unwrap_or("-"))
    )
}

pub fn chat_info(title: Option<&str>, id: i64, kind: &str) -> String {
    format!(
        "نام گروه: {}\nآیدی گروه: {id}\nنوع گروه: {kind}",
        escape_html(title.unwrap_or("-"))
    )
}

pub fn welcome(full_name: &str, chat_title: &str) -> String {
    format!(
        "درود {} به گروه {} خوش آمدید.",
        escape_html(full_name),
        escape_html(chat_title)
    )
}

pub fn farewell(full_name: &str) -> String {
    format!("بدرود {}!", escape_html(full_name))
}
