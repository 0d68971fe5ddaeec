//! SEO 关键词启发式：推荐指数、搜索意图、意图对应的标题模板
//!
//! 规则来自养生/饮食长尾词挖掘的经验值，供样例分析 Agent 排序关键词、样例标题 Agent 套模板。

use std::sync::OnceLock;

use regex::Regex;

const QUESTION_TERMS: &[&str] = &[
    "怎么", "为什么", "真的", "副作用", "危害", "能不能", "多久", "有用吗", "有效吗", "是否",
    "如何",
];
const PURCHASE_TERMS: &[&str] = &[
    "排行榜", "推荐", "哪个牌子", "价格", "怎么买", "测评", "京东", "淘宝", "购买", "哪里买",
];
const DOMAIN_TERMS: &[&str] = &[
    "控糖", "抗炎", "减脂", "祛湿", "养胃", "补气血", "熬夜", "养生", "饮食",
];
const URGENCY_TERMS: &[&str] = &["快速", "立即", "马上", "紧急", "最佳", "最好", "必须"];

/// 搜索意图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIntent {
    Question,
    Efficacy,
    SideEffect,
    Purchase,
    Comparison,
    Recipe,
    General,
}

impl SearchIntent {
    pub fn label(&self) -> &'static str {
        match self {
            SearchIntent::Question => "疑问",
            SearchIntent::Efficacy => "功效",
            SearchIntent::SideEffect => "副作用",
            SearchIntent::Purchase => "购买",
            SearchIntent::Comparison => "对比",
            SearchIntent::Recipe => "食谱",
            SearchIntent::General => "通用",
        }
    }

    fn terms(&self) -> &'static [&'static str] {
        match self {
            SearchIntent::Question => &[
                "怎么", "为什么", "如何", "什么", "是否", "能不能", "有用吗", "有效吗", "方法",
            ],
            SearchIntent::Efficacy => &["功效", "作用", "好处", "益处", "效果"],
            SearchIntent::SideEffect => &["副作用", "危害", "风险", "禁忌", "注意事项"],
            SearchIntent::Purchase => &[
                "排行榜", "推荐", "哪个牌子", "价格", "怎么买", "测评", "购买", "哪里买",
            ],
            SearchIntent::Comparison => &["和", "vs", "VS", "还是", "对比", "区别"],
            SearchIntent::Recipe => &["食谱", "菜单", "吃什么", "做法"],
            SearchIntent::General => &[],
        }
    }
}

fn contains_any(keyword: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| keyword.contains(t))
}

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

/// 关键词推荐指数：疑问 +6、购买 +5、长尾 +2/+3/+4、领域词 +3、紧迫词 +2、含数字 +1
pub fn keyword_score(keyword: &str) -> u32 {
    let mut score = 0;
    if contains_any(keyword, QUESTION_TERMS) {
        score += 6;
    }
    if contains_any(keyword, PURCHASE_TERMS) {
        score += 5;
    }
    score += match keyword.chars().count() {
        n if n >= 10 => 4,
        n if n >= 8 => 3,
        n if n >= 6 => 2,
        _ => 0,
    };
    if contains_any(keyword, DOMAIN_TERMS) {
        score += 3;
    }
    if contains_any(keyword, URGENCY_TERMS) {
        score += 2;
    }
    if digits().is_match(keyword) {
        score += 1;
    }
    score
}

/// 识别关键词的全部意图（按固定顺序）；一个都没有时为 [General]
pub fn detect_intents(keyword: &str) -> Vec<SearchIntent> {
    let intents: Vec<SearchIntent> = [
        SearchIntent::Question,
        SearchIntent::Efficacy,
        SearchIntent::SideEffect,
        SearchIntent::Purchase,
        SearchIntent::Comparison,
        SearchIntent::Recipe,
    ]
    .into_iter()
    .filter(|i| contains_any(keyword, i.terms()))
    .collect();

    if intents.is_empty() {
        vec![SearchIntent::General]
    } else {
        intents
    }
}

/// 主意图
pub fn primary_intent(keyword: &str) -> SearchIntent {
    detect_intents(keyword)[0]
}

/// 按意图套用标题模板
pub fn headline_templates(keyword: &str, intent: SearchIntent) -> Vec<String> {
    let templates: &[&str] = match intent {
        SearchIntent::Question => &[
            "{k}？真相让人意外",
            "医生不说，但{k}你必须知道",
            "90%的人都不知道的{k}真相",
            "{k}！看完这篇你就懂了",
        ],
        SearchIntent::Efficacy => &[
            "{k}的5个神奇效果，第3个很多人不知道",
            "坚持{k}，30天后身体的变化",
            "为什么明星都在{k}？效果惊人",
        ],
        SearchIntent::SideEffect => &[
            "{k}的副作用，再不知道就晚了",
            "别乱{k}！这3类人要注意",
            "{k}的禁忌，很多人第一个就错了",
        ],
        SearchIntent::Purchase => &[
            "{k}排行榜TOP5，第1名没想到",
            "买前必看！{k}避坑指南",
            "{k}怎么选？内行人告诉你真相",
        ],
        SearchIntent::Comparison => &[
            "{k}：一文看懂区别",
            "到底选哪个？{k}深度对比",
            "别再纠结了！{k}选哪个最好",
        ],
        SearchIntent::Recipe => &[
            "{k}大全，7天不重样",
            "营养师的{k}秘诀",
            "7天{k}计划，效果看得见",
        ],
        SearchIntent::General => &[
            "{k}：新手完全指南",
            "关于{k}，你需要知道的一切",
            "{k}的正确打开方式",
        ],
    };
    templates.iter().map(|t| t.replace("{k}", keyword)).collect()
}

/// 按推荐指数降序排列关键词（同分保持原顺序）
pub fn rank_keywords(keywords: &mut [String]) {
    keywords.sort_by_key(|k| std::cmp::Reverse(keyword_score(k)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_score() {
        // 疑问 6 + 长度 6 字 2 + 领域 3
        assert_eq!(keyword_score("熬夜怎么补救"), 11);
        // 短词、无意图
        assert_eq!(keyword_score("红枣"), 0);
        // 养肝 不在领域词表里
        assert_eq!(keyword_score("立春养肝"), 0);
        // 购买 5 + 长度 7 字 2 + 数字 1
        assert_eq!(keyword_score("枸杞排行榜前3"), 8);
    }

    #[test]
    fn test_detect_intents() {
        assert_eq!(detect_intents("红枣"), vec![SearchIntent::General]);
        assert_eq!(
            detect_intents("枸杞的功效和禁忌"),
            vec![
                SearchIntent::Efficacy,
                SearchIntent::SideEffect,
                SearchIntent::Comparison
            ]
        );
        assert_eq!(primary_intent("减脂餐食谱"), SearchIntent::Recipe);
    }

    #[test]
    fn test_templates_embed_keyword() {
        let titles = headline_templates("立春养肝", SearchIntent::General);
        assert_eq!(titles[0], "立春养肝：新手完全指南");
        assert!(titles.iter().all(|t| t.contains("立春养肝")));
    }

    #[test]
    fn test_every_intent_has_three_templates() {
        let intents = [
            SearchIntent::Question,
            SearchIntent::Efficacy,
            SearchIntent::SideEffect,
            SearchIntent::Purchase,
            SearchIntent::Comparison,
            SearchIntent::Recipe,
            SearchIntent::General,
        ];
        for intent in intents {
            assert!(headline_templates("枸杞", intent).len() >= 3, "{:?}", intent);
        }
        assert_eq!(
            headline_templates("枸杞", SearchIntent::Efficacy)[2],
            "为什么明星都在枸杞？效果惊人"
        );
        assert_eq!(
            headline_templates("枸杞", SearchIntent::Comparison)[2],
            "别再纠结了！枸杞选哪个最好"
        );
    }

    #[test]
    fn test_rank_keywords() {
        let mut kws = vec!["红枣".to_string(), "熬夜怎么补救".to_string()];
        rank_keywords(&mut kws);
        assert_eq!(kws[0], "熬夜怎么补救");
    }
}
